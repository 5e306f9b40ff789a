//! Elixir Term Conversion Utilities
//!
//! Converts tree nodes to Elixir terms through `TreeAccess`.

use rustler::{Encoder, Env, NewBinary, Term};

use crate::dom::{Namespace, NodeData, NodeId, TreeAccess};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    element,
    comment,
    pi,
    cdata,
    entity,
    namespace,
}

/// Convert a node to an Elixir term.
///
/// Elements become `{:element, name, attrs, children}`; text is a bare
/// binary; other leaves are tagged tuples.
pub fn node_to_term<'a, D: TreeAccess>(env: Env<'a>, doc: &D, node_id: NodeId) -> Term<'a> {
    let node = match doc.get_node(node_id) {
        Some(n) => n,
        None => return rustler::types::atom::nil().encode(env),
    };

    match &node.data {
        NodeData::Element(_) => {
            let name = doc.node_name(node_id).unwrap_or_default();
            let name_term = str_to_binary(env, &name);

            // Build lists back to front so each prepend is O(1)
            let mut attrs = Term::list_new_empty(env);
            for attr in doc.attributes_vec(node_id).into_iter().rev() {
                let attr_name = doc.node_name(attr).unwrap_or_default();
                let attr_value = doc.text_content(attr).unwrap_or("");
                let attr_tuple = (str_to_binary(env, &attr_name), str_to_binary(env, attr_value));
                attrs = attrs.list_prepend(attr_tuple.encode(env));
            }

            let mut children = Term::list_new_empty(env);
            for child in doc.children_vec(node_id).into_iter().rev() {
                children = children.list_prepend(node_to_term(env, doc, child));
            }

            (element(), name_term, attrs, children).encode(env)
        }
        NodeData::Text(content) => str_to_binary(env, content),
        NodeData::CData(content) => (cdata(), str_to_binary(env, content)).encode(env),
        NodeData::Comment(content) => (comment(), str_to_binary(env, content)).encode(env),
        NodeData::ProcessingInstruction { target, data } => {
            (pi(), str_to_binary(env, target), str_to_binary(env, data)).encode(env)
        }
        NodeData::Entity { name, text } => {
            (entity(), str_to_binary(env, name), str_to_binary(env, text)).encode(env)
        }
        NodeData::Namespace(ns) => (namespace(), namespace_to_term(env, ns)).encode(env),
        NodeData::Attribute { .. } => {
            let name = doc.node_name(node_id).unwrap_or_default();
            let value = doc.text_content(node_id).unwrap_or("");
            (str_to_binary(env, &name), str_to_binary(env, value)).encode(env)
        }
    }
}

/// `{prefix, uri}` as a pair of binaries
pub fn namespace_to_term<'a>(env: Env<'a>, ns: &Namespace) -> Term<'a> {
    (str_to_binary(env, ns.prefix()), str_to_binary(env, ns.uri())).encode(env)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
