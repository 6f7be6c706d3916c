#[cfg(test)]
mod proptest_hierarchy {
    use crate::hierarchy::build_at;
    use crate::model::FlatTag;
    use crate::tags;
    use proptest::prelude::*;

    fn tag_name() -> impl Strategy<Value = String> {
        let prefix = prop::sample::select(vec!["ET_", "FIT_", "PDIT_", "PRC_", "TRC_", "XYZ_", ""]);
        let number = 0u16..50;
        let suffix = prop::option::of(prop::sample::select(vec![
            "PV", "SP", "ALARM_HH", "PV_ALARM", "SetH", "",
        ]));
        (prefix, number, suffix).prop_map(|(p, n, s)| match s {
            Some(s) => format!("{p}{n}.{s}"),
            None => format!("{p}{n}"),
        })
    }

    fn flat_tags() -> impl Strategy<Value = Vec<FlatTag>> {
        prop::collection::vec(
            (
                tag_name(),
                prop::option::of("[a-z ]{0,8}"),
                prop::option::of(0.0f64..2e9),
            )
                .prop_map(|(name, description, last_update)| FlatTag {
                    name,
                    description,
                    last_update,
                    ..Default::default()
                }),
            0..60,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        // Property: same input, same output
        #[test]
        fn build_is_deterministic(input in flat_tags()) {
            prop_assert_eq!(build_at(&input, 1.0), build_at(&input, 1.0));
        }

        // Property: every dotted record lands in exactly one parent
        #[test]
        fn variables_partition_dotted_inputs(input in flat_tags()) {
            let out = build_at(&input, 1.0);
            let dotted = input.iter().filter(|t| t.name.contains('.')).count();
            let total: usize = out.iter().map(|p| p.variable_count).sum();
            prop_assert_eq!(total, dotted);

            for parent in &out {
                prop_assert_eq!(parent.variable_count, parent.variables.len());
                let alarms = parent.variables.iter().filter(|v| v.is_alarm).count();
                prop_assert_eq!(parent.alarm_count, alarms);
                for variable in &parent.variables {
                    prop_assert_eq!(&variable.full_name, &format!("{}.{}", parent.name, variable.name));
                }
            }
        }

        // Property: names unique and strictly ascending
        #[test]
        fn output_strictly_sorted(input in flat_tags()) {
            let out = build_at(&input, 1.0);
            for pair in out.windows(2) {
                prop_assert!(pair[0].name < pair[1].name, "{} !< {}", pair[0].name, pair[1].name);
            }
        }

        // Property: kind and category depend only on the parent name
        #[test]
        fn inference_is_a_function_of_name(input in flat_tags()) {
            for parent in build_at(&input, 1.0) {
                let row = tags::classify(&parent.name);
                prop_assert_eq!(parent.kind, row.kind);
                let explicit_category = input.iter().any(|t| t.name == parent.name && t.category.as_deref().is_some_and(|c| !c.is_empty()));
                if !explicit_category {
                    prop_assert_eq!(parent.category.as_str(), row.category);
                }
            }
        }

        // Property: last_update never precedes any contributing record
        #[test]
        fn last_update_is_latest(input in flat_tags()) {
            for parent in build_at(&input, 1.0) {
                for tag in &input {
                    let owner = crate::hierarchy::split_name(&tag.name).0;
                    if owner == parent.name {
                        if let Some(seen) = tag.last_update {
                            prop_assert!(parent.last_update >= seen);
                        }
                    }
                }
            }
        }
    }
}
