// crates/testgen-fixture/src/analyze.rs
// ============================================================================
// Module: Dependency Analyzer
// Description: Classifies HTTP operations as resource Producers or Consumers
//              (spec.md §4.5).
// Purpose: Find which operations a test for a Consumer operation needs to
//          run first to obtain a resource id to bind into its path.
// Dependencies: testgen-core
// ============================================================================

//! ## Overview
//! [`analyze`] walks every HTTP operation's `(method, path)` pair and
//! classifies it:
//! - A `POST` to a path with no `{param}` segments, whose body is an
//!   object, is a [`Role::Producer`] of the resource named by the path's
//!   last static segment.
//! - A `GET`/`PUT`/`PATCH`/`DELETE` to a path ending in one or more
//!   `{param}` segments is a [`Role::Consumer`] of every resource named
//!   along the way, outer first (`/users/{uid}/posts/{pid}` consumes
//!   `user` bound to `uid`, then `post` bound to `pid`).
//!
//! When more than one Producer matches a Consumer's resource type, the
//! analyzer picks the Producer whose path is the shortest prefix — a
//! deterministic tiebreak rather than an arbitrary "first one found".

use indexmap::IndexMap;
use testgen_core::HttpMethod;
use testgen_core::Operation;
use testgen_core::OperationKind;
use testgen_core::Schema;

/// One `(resource, path-param)` binding a Consumer operation needs
/// resolved before it can run, outer-to-inner order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBinding {
    /// Singularized resource type name, e.g. `"user"`.
    pub resource: String,
    /// The path parameter this resource's id is bound to.
    pub path_param: String,
}

/// An operation's dependency role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Creates a resource of the named type, assumed id-bearing.
    Producer {
        /// Singularized resource type name.
        resource: String,
    },
    /// Needs one or more resources set up before it can run.
    Consumer {
        /// Required bindings, outer resource first.
        bindings: Vec<ResourceBinding>,
    },
    /// Neither: a collection-level `GET`/`POST` with no path parameters
    /// that doesn't produce an id-bearing resource, or any non-HTTP
    /// operation.
    Independent,
}

/// One operation's classified role plus the index of the chosen Producer
/// for each of its bindings (`None` when no Producer matches that
/// resource type — the planner reports this as an unmet dependency).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Index into the specification's operation list.
    pub operation_index: usize,
    /// The operation's classified role.
    pub role: Role,
    /// For a `Consumer`, the chosen Producer operation index for each
    /// binding, in the same order as `Role::Consumer::bindings`.
    pub producers: Vec<Option<usize>>,
}

/// Classifies every operation in `operations` (spec.md §4.5).
#[must_use]
pub fn analyze(operations: &[Operation]) -> Vec<Dependency> {
    let roles: Vec<Role> = operations.iter().map(classify).collect();
    let producer_paths = producer_paths_by_resource(operations, &roles);

    roles
        .into_iter()
        .enumerate()
        .map(|(operation_index, role)| {
            let producers = match &role {
                Role::Consumer { bindings } => bindings
                    .iter()
                    .map(|binding| shortest_prefix_producer(&producer_paths, &binding.resource, operations))
                    .collect(),
                Role::Producer { .. } | Role::Independent => Vec::new(),
            };
            Dependency { operation_index, role, producers }
        })
        .collect()
}

/// Classifies a single operation (spec.md §4.5).
fn classify(op: &Operation) -> Role {
    let OperationKind::Http { method, path } = &op.kind else { return Role::Independent };
    let segments = path_segments(path);
    let bindings = resource_bindings(&segments);

    if bindings.is_empty() {
        if *method == HttpMethod::Post && body_is_object(op) {
            if let Some(resource) = segments.last().map(|s| singularize(s)) {
                return Role::Producer { resource };
            }
        }
        return Role::Independent;
    }

    match method {
        HttpMethod::Get | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete => Role::Consumer { bindings },
        HttpMethod::Post => Role::Independent,
    }
}

/// Whether the operation declares a body whose schema is an object (the
/// shape an id-bearing creation response implies a matching request has).
fn body_is_object(op: &Operation) -> bool {
    op.body.as_ref().is_some_and(|body| matches!(body.schema.collapse_single_variant_union(), Schema::Object { .. }))
}

/// Splits a URI template into segments, dropping the leading/trailing
/// empty segments produced by a leading/trailing `/`.
fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Returns `true` for a `{name}` path template segment.
fn is_param_segment(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

/// Pairs each `{param}` segment with the static segment immediately
/// preceding it, outer (leftmost) first.
fn resource_bindings(segments: &[&str]) -> Vec<ResourceBinding> {
    let mut bindings = Vec::new();
    let mut index = 0;
    while index + 1 < segments.len() {
        if !is_param_segment(segments[index]) && is_param_segment(segments[index + 1]) {
            let param_name = segments[index + 1].trim_start_matches('{').trim_end_matches('}');
            bindings.push(ResourceBinding { resource: singularize(segments[index]), path_param: param_name.to_string() });
            index += 2;
        } else {
            index += 1;
        }
    }
    bindings
}

/// Strips one trailing `s` from a path segment to approximate a resource
/// type's singular name (`"users"` -> `"user"`). Segments already singular
/// are returned unchanged.
fn singularize(segment: &str) -> String {
    segment.strip_suffix('s').unwrap_or(segment).to_string()
}

/// For every resource type, the operation index and path of every
/// Producer that creates it, in source order.
fn producer_paths_by_resource<'a>(operations: &'a [Operation], roles: &[Role]) -> IndexMap<String, Vec<(usize, &'a str)>> {
    let mut map: IndexMap<String, Vec<(usize, &str)>> = IndexMap::new();
    for (index, role) in roles.iter().enumerate() {
        if let Role::Producer { resource } = role {
            let OperationKind::Http { path, .. } = &operations[index].kind else { continue };
            map.entry(resource.clone()).or_default().push((index, path.as_str()));
        }
    }
    map
}

/// Picks the Producer operation index for `resource` whose path is the
/// shortest prefix, breaking ties by source declaration order (spec.md
/// §4.5, "If multiple Producers match one resource type... deterministic").
fn shortest_prefix_producer(producer_paths: &IndexMap<String, Vec<(usize, &str)>>, resource: &str, operations: &[Operation]) -> Option<usize> {
    let candidates = producer_paths.get(resource)?;
    let _ = operations;
    candidates.iter().min_by_key(|(_, path)| path.len()).map(|(index, _)| *index)
}

#[cfg(test)]
mod tests {
    use testgen_core::ObjectConstraints;
    use testgen_core::Parameter;
    use testgen_core::Response;

    use super::*;

    fn http_op(id: &str, method: HttpMethod, path: &str, body_object: bool) -> Operation {
        Operation {
            id: id.to_string(),
            kind: OperationKind::Http { method, path: path.to_string() },
            path_params: Vec::new(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: if body_object {
                Some(Parameter {
                    name: "body".to_string(),
                    required: true,
                    schema: Schema::Object {
                        properties: indexmap::IndexMap::new(),
                        required: indexmap::IndexSet::new(),
                        additional_allowed: true,
                        constraints: ObjectConstraints::default(),
                    },
                })
            } else {
                None
            },
            successes: vec![Response { status: 200, schema: Schema::Any }],
            errors: Vec::new(),
            description: String::new(),
            metadata: indexmap::IndexMap::new(),
        }
    }

    #[test]
    fn post_to_collection_is_a_producer_named_by_singularized_segment() {
        let op = http_op("create_user", HttpMethod::Post, "/users", true);
        assert_eq!(classify(&op), Role::Producer { resource: "user".to_string() });
    }

    #[test]
    fn get_by_id_is_a_consumer_bound_to_the_path_param() {
        let op = http_op("get_user", HttpMethod::Get, "/users/{id}", false);
        assert_eq!(classify(&op), Role::Consumer { bindings: vec![ResourceBinding { resource: "user".to_string(), path_param: "id".to_string() }] });
    }

    #[test]
    fn nested_resource_consumer_orders_outer_before_inner() {
        let op = http_op("get_post", HttpMethod::Get, "/users/{uid}/posts/{pid}", false);
        let Role::Consumer { bindings } = classify(&op) else { panic!("expected consumer") };
        assert_eq!(bindings[0].resource, "user");
        assert_eq!(bindings[0].path_param, "uid");
        assert_eq!(bindings[1].resource, "post");
        assert_eq!(bindings[1].path_param, "pid");
    }

    #[test]
    fn shortest_prefix_producer_wins_when_two_producers_share_a_resource_type() {
        let ops = vec![
            http_op("create_user_long", HttpMethod::Post, "/v1/admin/users", true),
            http_op("create_user_short", HttpMethod::Post, "/users", true),
            http_op("get_user", HttpMethod::Get, "/users/{id}", false),
        ];
        let deps = analyze(&ops);
        let consumer = &deps[2];
        assert_eq!(consumer.producers, vec![Some(1)]);
    }

    #[test]
    fn collection_get_with_no_path_params_is_independent() {
        let op = http_op("list_users", HttpMethod::Get, "/users", false);
        assert_eq!(classify(&op), Role::Independent);
    }
}
