//! Flat tag listing → parent/variable tree.
//!
//! The backend reports every point as its own record. Names of the form
//! `<parent>.<variable>` are grouped under their parent; everything known
//! about a parent that the backend does not state explicitly is inferred
//! from its name prefix (see [`crate::tags`]).

use crate::clock;
use crate::model::{FlatTag, ParentTag, Quality, Variable, VALUE_PLACEHOLDER};
use crate::tags;
use log::trace;
use std::collections::HashMap;

/// Split on the last dot: `A.B.PV` → (`A.B`, `Some("PV")`).
pub fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], Some(&name[pos + 1..])),
        None => (name, None),
    }
}

/// Build the hierarchy, stamping parents that carry no `last_update` with now.
pub fn build(flat_tags: &[FlatTag]) -> Vec<ParentTag> {
    build_at(flat_tags, clock::unix_secs())
}

/// Same as [`build`] with an explicit fallback timestamp.
pub fn build_at(flat_tags: &[FlatTag], now_secs: f64) -> Vec<ParentTag> {
    let mut parents: HashMap<&str, Entry> = HashMap::new();

    for tag in flat_tags {
        let (parent_name, variable_name) = split_name(&tag.name);
        let entry = parents
            .entry(parent_name)
            .or_insert_with(|| Entry::seeded(parent_name));

        if let Some(seen) = tag.last_update {
            entry.latest_update = Some(match entry.latest_update {
                Some(current) if current >= seen => current,
                _ => seen,
            });
        }

        match variable_name {
            Some(variable_name) => {
                let is_alarm = Variable::is_alarm_name(variable_name);
                entry.parent.variables.push(Variable {
                    name: variable_name.to_string(),
                    full_name: tag.name.clone(),
                    description: tag.description.clone(),
                    units: tag.units.clone(),
                    category: tag.category.clone(),
                    quality: tag.quality.unwrap_or_default(),
                    last_update: tag.last_update,
                    is_alarm,
                    value: VALUE_PLACEHOLDER.to_string(),
                });
                entry.parent.variable_count += 1;
                if is_alarm {
                    entry.parent.alarm_count += 1;
                }
            }
            None => {
                trace!("explicit parent record for {}", parent_name);
                overwrite_non_empty(&mut entry.parent.description, &tag.description);
                overwrite_non_empty(&mut entry.parent.category, &tag.category);
                overwrite_non_empty(&mut entry.parent.units, &tag.units);
            }
        }
    }

    let mut out: Vec<ParentTag> = parents
        .into_values()
        .map(|entry| entry.finish(now_secs))
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

struct Entry {
    parent: ParentTag,
    latest_update: Option<f64>,
}

impl Entry {
    fn seeded(name: &str) -> Self {
        let row = tags::classify(name);
        Self {
            parent: ParentTag {
                name: name.to_string(),
                description: tags::describe(name),
                category: row.category.to_string(),
                kind: row.kind,
                units: row.units.to_string(),
                variables: Vec::new(),
                variable_count: 0,
                alarm_count: 0,
                quality: Quality::Good,
                last_update: 0.0,
                is_expanded: false,
            },
            latest_update: None,
        }
    }

    fn finish(mut self, now_secs: f64) -> ParentTag {
        self.parent.last_update = self.latest_update.unwrap_or(now_secs);
        self.parent
    }
}

fn overwrite_non_empty(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        if !value.is_empty() {
            target.clone_from(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TagKind;

    const NOW: f64 = 1_700_000_000.0;

    fn names(parents: &[ParentTag]) -> Vec<&str> {
        parents.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn splits_on_last_dot() {
        assert_eq!(split_name("FIT_100.PV"), ("FIT_100", Some("PV")));
        assert_eq!(split_name("A.B.PV"), ("A.B", Some("PV")));
        assert_eq!(split_name("FIT_100"), ("FIT_100", None));
        assert_eq!(split_name("FIT_100."), ("FIT_100", Some("")));
    }

    #[test]
    fn output_is_sorted_by_name() {
        let input = vec![FlatTag::new("TIT_002"), FlatTag::new("TIT_001.PV")];
        let out = build_at(&input, NOW);
        assert_eq!(names(&out), vec!["TIT_001", "TIT_002"]);
    }

    #[test]
    fn infers_from_prefix() {
        let input = vec![FlatTag::new("FIT_100"), FlatTag::new("FIT_100.PV")];
        let out = build_at(&input, NOW);
        assert_eq!(out.len(), 1);

        let parent = &out[0];
        assert_eq!(parent.name, "FIT_100");
        assert_eq!(parent.category, "Instrumentos");
        assert_eq!(parent.kind, TagKind::Instrument);
        assert_eq!(parent.units, "SCFH");
        assert_eq!(parent.description, "Flow Indicator Transmitter FIT_100");
        assert_eq!(parent.variable_count, 1);
        assert_eq!(parent.variables[0].name, "PV");
        assert_eq!(parent.variables[0].full_name, "FIT_100.PV");
        assert!(!parent.variables[0].is_alarm);
        assert_eq!(parent.variables[0].value, "-");
        assert_eq!(parent.quality, Quality::Good);
        assert!(!parent.is_expanded);
    }

    #[test]
    fn unknown_prefix_falls_back() {
        let out = build_at(&[FlatTag::new("XYZ_1.PV")], NOW);
        assert_eq!(out[0].category, "Otros");
        assert_eq!(out[0].description, "Industrial Tag XYZ_1");
        assert_eq!(out[0].kind, TagKind::Instrument);
        assert_eq!(out[0].units, "");
    }

    #[test]
    fn controllers_are_classified() {
        let out = build_at(&[FlatTag::new("PRC_1201.SP")], NOW);
        assert_eq!(out[0].kind, TagKind::Controller);
        assert_eq!(out[0].category, "ControladorsPID");
        assert_eq!(out[0].units, "PSI");
    }

    #[test]
    fn counts_alarm_variables() {
        let input = vec![
            FlatTag::new("PIT_5.ALARM_HH"),
            FlatTag::new("PIT_5.PV_ALARM"),
            FlatTag::new("PIT_5.PV"),
        ];
        let out = build_at(&input, NOW);
        assert_eq!(out[0].variable_count, 3);
        assert_eq!(out[0].alarm_count, 2);
        assert!(out[0].variable("ALARM_HH").unwrap().is_alarm);
        assert!(!out[0].variable("PV").unwrap().is_alarm);
    }

    #[test]
    fn explicit_parent_overrides_non_empty_fields() {
        let input = vec![
            FlatTag::new("LIT_4.PV"),
            FlatTag::new("LIT_4")
                .with_description("Tank 4 level")
                .with_units("")
                .with_category("Tanks"),
        ];
        let out = build_at(&input, NOW);
        assert_eq!(out[0].description, "Tank 4 level");
        assert_eq!(out[0].category, "Tanks");
        // Empty units never overwrite the inferred value.
        assert_eq!(out[0].units, "%");
        assert_eq!(out[0].variable_count, 1);
    }

    #[test]
    fn variables_keep_input_order() {
        let input = vec![
            FlatTag::new("TRC_1.SP"),
            FlatTag::new("TRC_1.CV"),
            FlatTag::new("TRC_1.KP"),
        ];
        let out = build_at(&input, NOW);
        let order: Vec<&str> = out[0].variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(order, vec!["SP", "CV", "KP"]);
    }

    #[test]
    fn variable_quality_defaults_to_good() {
        let mut bad = FlatTag::new("ET_1.PV");
        bad.quality = Some(Quality::Bad);
        let out = build_at(&[bad, FlatTag::new("ET_1.SV")], NOW);
        assert_eq!(out[0].variables[0].quality, Quality::Bad);
        assert_eq!(out[0].variables[1].quality, Quality::Good);
        // Parent quality is not aggregated from children.
        assert_eq!(out[0].quality, Quality::Good);
    }

    #[test]
    fn last_update_takes_latest_seen_or_now() {
        let input = vec![
            FlatTag::new("ET_1.PV").with_last_update(100.0),
            FlatTag::new("ET_1.SV").with_last_update(300.0),
            FlatTag::new("ET_1.SetH").with_last_update(200.0),
            FlatTag::new("ET_2.PV"),
        ];
        let out = build_at(&input, NOW);
        assert_eq!(out[0].last_update, 300.0);
        assert_eq!(out[1].last_update, NOW);
    }

    #[test]
    fn decoded_listing_with_off_type_fields_still_builds() {
        let input: Vec<FlatTag> = serde_json::from_str(
            r#"[
                {"name":"FIT_1","description":7},
                {"name":"FIT_1.PV","quality":0,"last_update":"250"},
                {"name":"FIT_1.ALARM_HH","quality":"bad","last_update":100}
            ]"#,
        )
        .unwrap();
        let out = build_at(&input, NOW);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].description, "7");
        assert_eq!(out[0].variable_count, 2);
        assert_eq!(out[0].alarm_count, 1);
        assert_eq!(out[0].last_update, 250.0);
        assert_eq!(out[0].variables[0].quality, Quality::Good);
        assert_eq!(out[0].variables[1].quality, Quality::Bad);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(build_at(&[], NOW).is_empty());
    }

    #[test]
    fn nested_dots_group_under_longest_parent() {
        let out = build_at(&[FlatTag::new("AREA.FIT_1.PV")], NOW);
        assert_eq!(out[0].name, "AREA.FIT_1");
        assert_eq!(out[0].variables[0].name, "PV");
        assert_eq!(out[0].category, "Otros");
    }
}
