// crates/testgen-payload/src/builder.rs
// ============================================================================
// Module: Payload Builder
// Description: Assembles one operation's full payload list from its intents
//              (spec.md §4.3, §4.4).
// Purpose: The single entry point downstream stages call: builds the golden
//          record once, then applies every intent's mutation against it.
// Dependencies: testgen-core, testgen-intent, crate::golden, crate::mutate
// ============================================================================

use testgen_core::Operation;
use testgen_core::TypeDecl;
use testgen_intent::Intent;
use testgen_intent::Target;

use crate::golden;
use crate::mutate::mutate;
use crate::payload::Payload;

/// Builds one [`Payload`] per `intent`, all rooted in the same golden record
/// (spec.md §4.3: "exactly one golden record per operation", §4.4: "exactly
/// one mutation per intent").
///
/// `HAPPY_PATH`'s [`Target::WholeBody`] produces the golden record verbatim;
/// every other intent's mutation touches only its own target path, so the
/// returned payloads differ from each other and from the golden record by
/// exactly that one slot.
#[must_use]
pub fn build_payloads(op: &Operation, intents: &[Intent], types: &[TypeDecl]) -> Vec<Payload> {
    let golden = golden::build(op, types);
    intents
        .iter()
        .map(|intent| {
            if matches!(intent.target, Target::WholeBody) {
                Payload {
                    operation_id: op.id.clone(),
                    intent_id: intent.id,
                    target_field: None,
                    body: golden.body.clone(),
                    path_params: golden.path_params.clone(),
                    query_params: golden.query_params.clone(),
                    headers: golden.headers.clone(),
                    expected_outcome: intent.expected_outcome,
                    description: intent.description.clone(),
                }
            } else {
                mutate(op, &golden, intent, types)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use testgen_core::HttpMethod;
    use testgen_core::IntentId;
    use testgen_core::ObjectConstraints;
    use testgen_core::OperationKind;
    use testgen_core::Parameter;
    use testgen_core::Response;
    use testgen_core::Schema;
    use testgen_intent::ExpectedOutcome;
    use testgen_intent::FieldPath;

    use super::*;

    fn simple_get_op() -> Operation {
        Operation {
            id: "get_widget".to_string(),
            kind: OperationKind::Http { method: HttpMethod::Get, path: "/widgets/{id}".to_string() },
            path_params: vec![Parameter { name: "id".to_string(), required: true, schema: Schema::plain_string() }],
            query_params: Vec::new(),
            headers: Vec::new(),
            body: None,
            successes: vec![Response { status: 200, schema: Schema::Any }],
            errors: vec![Response { status: 404, schema: Schema::Any }],
            description: String::new(),
            metadata: indexmap::IndexMap::new(),
        }
    }

    #[test]
    fn happy_path_payload_carries_the_golden_record_verbatim() {
        let op = simple_get_op();
        let golden = golden::build(&op, &[]);
        let intents = vec![Intent::new(IntentId::HappyPath, Target::WholeBody, ExpectedOutcome::HttpStatus(200), "happy path")];
        let payloads = build_payloads(&op, &intents, &[]);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].path_params, golden.path_params);
        assert_eq!(payloads[0].target_field, None);
    }

    #[test]
    fn every_other_payload_shares_the_same_untouched_params_except_its_target() {
        let mut op = simple_get_op();
        op.body = Some(Parameter {
            name: "body".to_string(),
            required: true,
            schema: Schema::Object {
                properties: [("name".to_string(), Schema::plain_string())].into_iter().collect(),
                required: ["name".to_string()].into_iter().collect(),
                additional_allowed: true,
                constraints: ObjectConstraints::default(),
            },
        });
        let intents = vec![
            Intent::new(IntentId::HappyPath, Target::WholeBody, ExpectedOutcome::HttpStatus(200), "happy"),
            Intent::new(
                IntentId::RequiredFieldMissing,
                Target::BodyField(FieldPath(vec!["name".to_string()])),
                ExpectedOutcome::HttpStatus(400),
                "missing name",
            ),
            Intent::new(IntentId::ResourceNotFound, Target::PathParam("id".to_string()), ExpectedOutcome::HttpStatus(404), "not found"),
        ];
        let payloads = build_payloads(&op, &intents, &[]);
        assert_eq!(payloads.len(), 3);
        // the resource-not-found payload leaves the body untouched
        assert_eq!(payloads[2].body, payloads[0].body);
        // the required-field-missing payload leaves path params untouched
        assert_eq!(payloads[1].path_params, payloads[0].path_params);
        assert_eq!(payloads[2].target_field.as_deref(), Some("id"));
    }
}
