//! RustyTree - Mutable in-memory XML element tree
//!
//! Layers:
//! - `dom`: arena tree, dual single/list storage, list views, namespace scope
//! - `config`: tree behaviour knobs (env overridable)
//! - NIFs below: a thin BEAM surface over trees held in `ResourceArc`s

use rustler::types::atom;
use rustler::{Encoder, Env, NifResult, ResourceArc, Term};

pub mod config;
pub mod dom;
pub mod error;
mod resource;
mod term;

use config::TreeConfig;
use dom::{NodeId, XmlTree};
use resource::{TreeRef, TreeResource};
use term::{namespace_to_term, node_to_term};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                PEAK_ALLOCATED.fetch_max(current, Ordering::Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

#[cfg(feature = "memory_tracking")]
use std::sync::atomic::Ordering;

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory() -> usize {
    tracking::ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    tracking::PEAK_ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    let current = tracking::ALLOCATED.load(Ordering::SeqCst);
    let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
    (current, peak)
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    (0, 0)
}

// ============================================================================
// Term helpers
// ============================================================================

/// `{:ok, value}` or `{:error, message}`
fn reply<'a, T: Encoder>(
    env: Env<'a>,
    result: Result<error::Result<T>, &'static str>,
) -> Term<'a> {
    match result {
        Ok(Ok(value)) => (atom::ok(), value).encode(env),
        Ok(Err(e)) => (atom::error(), e.to_string()).encode(env),
        Err(reason) => (atom::error(), reason).encode(env),
    }
}

/// Bare `:ok` or `{:error, message}`
fn reply_unit<'a>(env: Env<'a>, result: Result<error::Result<()>, &'static str>) -> Term<'a> {
    match result {
        Ok(Ok(())) => atom::ok().encode(env),
        Ok(Err(e)) => (atom::error(), e.to_string()).encode(env),
        Err(reason) => (atom::error(), reason).encode(env),
    }
}

/// The bare value, or `{:error, reason}` when the tree lock failed
fn value_or_error<'a, T: Encoder>(env: Env<'a>, result: Result<T, &'static str>) -> Term<'a> {
    match result {
        Ok(value) => value.encode(env),
        Err(reason) => (atom::error(), reason).encode(env),
    }
}

#[inline]
fn node(id: u32) -> NodeId {
    NodeId::from_raw(id)
}

// ============================================================================
// Tree construction
// ============================================================================

/// Create an empty tree configured from the environment
#[rustler::nif]
fn new_tree() -> TreeRef {
    ResourceArc::new(TreeResource::new(TreeConfig::from_env()))
}

/// Create an empty tree with the string-value separator set explicitly
#[rustler::nif]
fn new_tree_with_separator(enabled: bool) -> TreeRef {
    let config = TreeConfig::from_env().with_separator(enabled);
    ResourceArc::new(TreeResource::new(config))
}

/// Create the document's root element from a `prefix:local` name and URI
#[rustler::nif]
fn create_root<'a>(
    env: Env<'a>,
    tree: TreeRef,
    name: &str,
    uri: &str,
) -> NifResult<Term<'a>> {
    let result = tree.with_tree_mut(|tree| {
        let qname = tree.factory_mut().qname_from_str(name, uri);
        let root = tree.create_element(qname);
        tree.set_root_element(root).map(|_| root.raw())
    });
    Ok(reply(env, result))
}

/// Append a child element. An empty URI resolves the name in scope.
#[rustler::nif]
fn add_element<'a>(
    env: Env<'a>,
    tree: TreeRef,
    parent: u32,
    name: &str,
    uri: &str,
) -> NifResult<Term<'a>> {
    let result = tree.with_tree_mut(|tree| {
        let child = if uri.is_empty() {
            tree.add_element_named(node(parent), name)
        } else {
            let qname = tree.factory_mut().qname_from_str(name, uri);
            tree.add_element(node(parent), qname)
        };
        child.map(NodeId::raw)
    });
    Ok(reply(env, result))
}

#[rustler::nif]
fn add_text<'a>(env: Env<'a>, tree: TreeRef, parent: u32, text: &str) -> NifResult<Term<'a>> {
    let result = tree.with_tree_mut(|tree| tree.add_text(node(parent), text).map(NodeId::raw));
    Ok(reply(env, result))
}

#[rustler::nif]
fn add_namespace<'a>(
    env: Env<'a>,
    tree: TreeRef,
    element: u32,
    prefix: &str,
    uri: &str,
) -> NifResult<Term<'a>> {
    let result = tree.with_tree_mut(|tree| {
        tree.add_namespace(node(element), prefix, uri).map(NodeId::raw)
    });
    Ok(reply(env, result))
}

/// Set an attribute; `nil` removes it
#[rustler::nif]
fn set_attribute<'a>(
    env: Env<'a>,
    tree: TreeRef,
    element: u32,
    name: &str,
    value: Option<&str>,
) -> NifResult<Term<'a>> {
    let result = tree.with_tree_mut(|tree| {
        tree.set_attribute(node(element), name, value).map(|_| ())
    });
    Ok(reply_unit(env, result))
}

/// Whether the child was present, or `{:error, reason}`
#[rustler::nif]
fn remove_node<'a>(env: Env<'a>, tree: TreeRef, parent: u32, child: u32) -> NifResult<Term<'a>> {
    let result = tree.with_tree_mut(|tree| tree.remove_node(node(parent), node(child)));
    Ok(value_or_error(env, result))
}

/// Deep copy of a node, detached
#[rustler::nif]
fn clone_node<'a>(env: Env<'a>, tree: TreeRef, id: u32) -> NifResult<Term<'a>> {
    let result = tree.with_tree_mut(|tree| tree.clone_node(node(id)).map(NodeId::raw));
    Ok(reply(env, result))
}

// ============================================================================
// Queries
// ============================================================================

#[rustler::nif]
fn node_count<'a>(env: Env<'a>, tree: TreeRef, element: u32) -> NifResult<Term<'a>> {
    let result = tree.with_tree(|tree| tree.node_count(node(element)));
    Ok(value_or_error(env, result))
}

#[rustler::nif]
fn get_text<'a>(env: Env<'a>, tree: TreeRef, element: u32) -> NifResult<Term<'a>> {
    let result = tree.with_tree(|tree| tree.text(node(element)).into_owned());
    Ok(value_or_error(env, result))
}

#[rustler::nif]
fn get_string_value<'a>(env: Env<'a>, tree: TreeRef, id: u32) -> NifResult<Term<'a>> {
    let result = tree.with_tree(|tree| tree.string_value(node(id)).into_owned());
    Ok(value_or_error(env, result))
}

/// `{prefix, uri}` bound to `prefix` at `element`, or nil
#[rustler::nif]
fn namespace_for_prefix<'a>(
    env: Env<'a>,
    tree: TreeRef,
    element: u32,
    prefix: &str,
) -> NifResult<Term<'a>> {
    let result = tree.with_tree(|tree: &XmlTree| {
        match tree.namespace_for_prefix(node(element), prefix) {
            Some(ns) => namespace_to_term(env, ns),
            None => atom::nil().encode(env),
        }
    });
    Ok(value_or_error(env, result))
}

/// Encode a node (the root element when `id` is nil) as nested terms
#[rustler::nif]
fn to_term<'a>(env: Env<'a>, tree: TreeRef, id: Option<u32>) -> NifResult<Term<'a>> {
    let result = tree.with_tree(|tree| {
        match id.map(node).or_else(|| tree.root_element()) {
            Some(target) => node_to_term(env, tree, target),
            None => atom::nil().encode(env),
        }
    });
    Ok(value_or_error(env, result))
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.RustyTree.Native");
