// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Variable Harvester (§4.D): walks paused call frames and scope chains
//! through the debugger's property-inspection calls, materializing a
//! bounded tree of [`CapturedValue`]s.

use std::collections::BTreeMap;

use aivory_core::model::MAX_STACK_FRAMES;
use aivory_core::{CapturedValue, StackFrame, TypeTag};

use crate::cache::Harvest;
use crate::link::{CallFrame, InspectorLink, PropertyDescriptor, RemoteValue, ScopeKind};

const NATIVE_PREFIX: &str = "native ";
const VENDOR_SEGMENTS: &[&str] = &["/node_modules/", "/vendor/"];
const RUNTIME_INTERNAL_PREFIXES: &[&str] = &["node:", "internal/"];

/// Property names never harvested regardless of scope, matching host
/// globals that would otherwise dominate every frame's locals.
const NAME_BLOCKLIST: &[&str] = &[
    "process",
    "console",
    "global",
    "module",
    "exports",
    "require",
    "__filename",
    "__dirname",
    "Buffer",
    "setTimeout",
    "setInterval",
    "setImmediate",
    "clearTimeout",
    "clearInterval",
    "clearImmediate",
    "queueMicrotask",
    "performance",
    "fetch",
    "arguments",
    "this",
];

fn scope_kinds_for_depth(scope_depth: u8) -> &'static [ScopeKind] {
    match scope_depth {
        0 => &[ScopeKind::Local, ScopeKind::Catch, ScopeKind::Block],
        1 => &[ScopeKind::Local, ScopeKind::Catch, ScopeKind::Block, ScopeKind::Closure],
        _ => &[
            ScopeKind::Local,
            ScopeKind::Catch,
            ScopeKind::Block,
            ScopeKind::Closure,
            ScopeKind::Module,
            ScopeKind::With,
            ScopeKind::Script,
        ],
    }
}

fn is_harvestable_name(name: &str) -> bool {
    !name.starts_with("__") && name != "constructor" && !NAME_BLOCKLIST.contains(&name)
}

fn source_available(url: &str) -> bool {
    if VENDOR_SEGMENTS.iter().any(|seg| url.contains(seg)) {
        return false;
    }
    !RUNTIME_INTERNAL_PREFIXES.iter().any(|prefix| url.starts_with(prefix))
}

fn stack_frame_for(frame: &CallFrame) -> StackFrame {
    let is_native = frame.url.starts_with(NATIVE_PREFIX);
    StackFrame {
        method_name: if frame.function_name.is_empty() {
            StackFrame::ANONYMOUS.to_owned()
        } else {
            frame.function_name.clone()
        },
        class_name: None,
        file_name: frame.url.rsplit('/').next().map(str::to_owned),
        file_path: Some(frame.url.clone()),
        line_number: frame.line_number + 1,
        column_number: frame.column_number,
        is_native,
        source_available: !is_native && source_available(&frame.url),
    }
}

fn type_tag_for(value: &RemoteValue) -> TypeTag {
    match (value.type_name.as_str(), value.subtype.as_deref()) {
        ("undefined", _) => TypeTag::Undefined,
        ("boolean", _) => TypeTag::Boolean,
        ("number", _) => TypeTag::Number,
        ("bigint", _) => TypeTag::Bigint,
        ("string", _) => TypeTag::String,
        ("symbol", _) => TypeTag::Symbol,
        ("function", _) => TypeTag::Function,
        (_, Some("null")) => TypeTag::Null,
        (_, Some("array")) => TypeTag::Array,
        (_, Some("map")) => TypeTag::Map,
        (_, Some("set")) => TypeTag::Set,
        (_, Some("error")) => TypeTag::Error,
        (_, Some("date")) => TypeTag::Date,
        (_, Some("regexp")) => TypeTag::Regexp,
        _ => TypeTag::ObjectOfClass,
    }
}

fn printable_form(value: &RemoteValue) -> String {
    if let Some(primitive) = &value.primitive {
        if let Some(s) = primitive.as_str() {
            return s.to_owned();
        }
        return primitive.to_string();
    }
    value.description.clone().unwrap_or_default()
}

fn array_length_from_description(description: &str) -> Option<usize> {
    let inner = description.strip_prefix("Array(")?.strip_suffix(')')?;
    inner.parse().ok()
}

struct Limits {
    max_capture_depth: usize,
    max_string_length: usize,
    max_collection_size: usize,
}

/// Recursively materialize one property's value into a [`CapturedValue`],
/// expanding containers one level deeper while `depth` permits.
async fn materialize(
    link: &dyn InspectorLink,
    name: &str,
    value: &RemoteValue,
    depth: usize,
    limits: &Limits,
) -> CapturedValue {
    let tag = type_tag_for(value);
    let printed = printable_form(value);
    let leaf = CapturedValue::leaf(name, tag, printed.clone(), limits.max_string_length);

    if depth >= limits.max_capture_depth {
        return leaf;
    }

    match tag {
        TypeTag::Array => {
            let Some(array_length) = array_length_from_description(&printed) else { return leaf };
            if array_length > limits.max_collection_size || depth + 1 >= limits.max_capture_depth {
                return leaf.with_array_elements(array_length, Vec::new(), limits.max_collection_size);
            }
            let Some(object_id) = &value.object_id else {
                return leaf.with_array_elements(array_length, Vec::new(), limits.max_collection_size);
            };
            let properties = link.get_properties(object_id).await.unwrap_or_default();
            let mut elements = Vec::with_capacity(properties.len());
            for prop in properties.iter().filter(|p| p.name.parse::<usize>().is_ok()) {
                elements.push(Box::pin(materialize(link, &prop.name, &prop.value, depth + 1, limits)).await);
            }
            leaf.with_array_elements(array_length, elements, limits.max_collection_size)
        }
        TypeTag::ObjectOfClass => {
            let Some(object_id) = &value.object_id else { return leaf };
            if depth + 1 >= limits.max_capture_depth {
                return leaf;
            }
            let properties = link.get_properties(object_id).await.unwrap_or_default();
            let mut children = BTreeMap::new();
            for prop in properties.iter().filter(|p| is_harvestable_name(&p.name)) {
                let child = Box::pin(materialize(link, &prop.name, &prop.value, depth + 1, limits)).await;
                children.insert(prop.name.clone(), child);
            }
            leaf.with_children(children)
        }
        _ => leaf,
    }
}

async fn harvest_scope(
    link: &dyn InspectorLink,
    object_id: &str,
    frame_prefix: &str,
    local_variables: &mut BTreeMap<String, CapturedValue>,
    limits: &Limits,
) {
    let properties: Vec<PropertyDescriptor> = link.get_properties(object_id).await.unwrap_or_default();
    for prop in properties.into_iter().filter(|p| is_harvestable_name(&p.name)) {
        let captured = materialize(link, &prop.name, &prop.value, 0, limits).await;
        local_variables.insert(format!("{frame_prefix}{}", prop.name), captured);
    }
}

/// Walk up to 50 paused call frames, building the stack trace and, for
/// frames within `max_capture_depth`, their local variables.
pub async fn harvest(
    link: &dyn InspectorLink,
    call_frames: &[CallFrame],
    max_capture_depth: usize,
    max_string_length: usize,
    max_collection_size: usize,
    scope_depth: u8,
) -> Harvest {
    let limits = Limits { max_capture_depth, max_string_length, max_collection_size };
    let scope_kinds = scope_kinds_for_depth(scope_depth);

    let mut stack_trace = Vec::new();
    let mut local_variables = BTreeMap::new();

    for (index, frame) in call_frames.iter().take(MAX_STACK_FRAMES).enumerate() {
        stack_trace.push(stack_frame_for(frame));

        if index >= max_capture_depth {
            continue;
        }
        let prefix = if index == 0 { String::new() } else { format!("frame{index}.") };
        for scope in frame.scope_chain.iter().filter(|s| scope_kinds.contains(&s.kind)) {
            harvest_scope(link, &scope.object_id, &prefix, &mut local_variables, &limits).await;
        }
    }

    Harvest { locals: local_variables, stack_trace }
}

#[cfg(test)]
#[path = "harvester_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
