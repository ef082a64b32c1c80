//! Override resolution: merges a template version with an item's overrides.
//!
//! Intro and section content follow two different rules on purpose:
//!
//! - **Intro** is truthiness-based. An empty `description` counts as "no
//!   override" and falls through to the version intro. Existing items rely
//!   on this, so it must not be tightened.
//! - **Sections** are presence-based. A key present in `overrides` wins even
//!   when its value is the empty string, which lets an item blank out a
//!   section.
//!
//! Keep these as two separate functions. Folding them into one helper would
//! silently change one of the two behaviours.
//!
//! Merged output is never stored; it is always recomputed from the template
//! and the item description.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::template::{Section, Template, TemplateVersion};

/// Item-level description record, authored against one template version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDescription {
    #[serde(default)]
    pub template_id: Option<Uuid>,
    /// Version the item was authored against. May lag the template's active version.
    #[serde(default)]
    pub template_version: u32,
    #[serde(default)]
    pub description: Option<String>,
    /// Sparse: only overridden section keys are present.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveSection {
    pub key: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveContent {
    pub intro: String,
    pub sections: Vec<EffectiveSection>,
    /// Version the content was resolved from.
    pub version: u32,
    /// True when the item's pinned version was missing and the active one was used.
    pub fell_back: bool,
}

/// Pick the version to merge: the item's pinned version, else the active one.
pub fn select_version<'a>(
    template: &'a Template,
    item: &ItemDescription,
) -> Option<(&'a TemplateVersion, bool)> {
    if let Some(pinned) = template.version(item.template_version) {
        return Some((pinned, false));
    }
    template
        .active_version
        .and_then(|active| template.version(active))
        .map(|v| (v, true))
}

/// Effective intro: a non-empty item description, else the version intro, else "".
pub fn resolve_intro(item: &ItemDescription, version: &TemplateVersion) -> String {
    match item.description.as_deref() {
        Some(description) if !description.is_empty() => description.to_string(),
        _ => version.intro.clone().unwrap_or_default(),
    }
}

/// Effective section content: an override when the key is present (even if
/// empty), else the section content, else "".
pub fn resolve_section_content(
    overrides: &BTreeMap<String, String>,
    section: &Section,
) -> String {
    match overrides.get(&section.key) {
        Some(content) => content.clone(),
        None => section.content.clone().unwrap_or_default(),
    }
}

/// Compute the effective content of an item.
///
/// Returns `None` when neither the pinned nor the active version exists.
/// That is a normal "nothing to show" outcome, not an error.
pub fn resolve_effective_content(
    template: &Template,
    item: &ItemDescription,
) -> Option<EffectiveContent> {
    let (version, fell_back) = select_version(template, item)?;

    let sections = version
        .sections
        .iter()
        .map(|section| EffectiveSection {
            key: section.key.clone(),
            title: section.title.clone(),
            content: resolve_section_content(&item.overrides, section),
        })
        .collect();

    Some(EffectiveContent {
        intro: resolve_intro(item, version),
        sections,
        version: version.version,
        fell_back,
    })
}

/// Override keys with no matching section in the resolved version.
///
/// These are expected drift after a template edit and are ignored by
/// resolution; editors use this list to offer clean-up.
pub fn stale_override_keys(template: &Template, item: &ItemDescription) -> Vec<String> {
    let Some((version, _)) = select_version(template, item) else {
        return item.overrides.keys().cloned().collect();
    };
    item.overrides
        .keys()
        .filter(|key| !version.sections.iter().any(|s| &s.key == *key))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::template::VersionDraft;

    fn version(n: u32, intro: &str, sections: Vec<Section>) -> TemplateVersion {
        TemplateVersion {
            version: n,
            intro: Some(intro.to_string()),
            sections,
        }
    }

    fn template(active: Option<u32>, versions: Vec<TemplateVersion>) -> Template {
        let mut t = Template::new("t", "owner");
        t.last_version = versions.iter().map(|v| v.version).max().unwrap_or(0);
        t.active_version = active;
        t.versions = versions;
        t
    }

    fn item(template_version: u32, description: &str, overrides: &[(&str, &str)]) -> ItemDescription {
        ItemDescription {
            template_id: None,
            template_version,
            description: Some(description.to_string()),
            overrides: overrides
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn two_versions() -> Template {
        template(
            Some(2),
            vec![
                version(1, "V1", vec![Section::new("s1", "One", "first")]),
                version(2, "V2", vec![Section::new("s1", "One", "second")]),
            ],
        )
    }

    #[test]
    fn pinned_version_is_preferred() {
        let out = resolve_effective_content(&two_versions(), &item(1, "", &[])).unwrap();
        assert_eq!(out.version, 1);
        assert_eq!(out.intro, "V1");
        assert!(!out.fell_back);
    }

    #[test]
    fn missing_pinned_version_falls_back_to_active() {
        let out = resolve_effective_content(&two_versions(), &item(99, "", &[])).unwrap();
        assert_eq!(out.version, 2);
        assert_eq!(out.sections[0].content, "second");
        assert!(out.fell_back);
    }

    #[test]
    fn missing_active_version_resolves_to_none() {
        let mut t = two_versions();
        t.active_version = Some(42);
        assert!(resolve_effective_content(&t, &item(99, "", &[])).is_none());
    }

    #[test]
    fn template_without_versions_resolves_to_none() {
        let t = template(None, vec![]);
        assert!(resolve_effective_content(&t, &item(1, "x", &[])).is_none());
    }

    #[test]
    fn empty_description_falls_through_to_version_intro() {
        let t = template(Some(1), vec![version(1, "Hello", vec![])]);
        let out = resolve_effective_content(&t, &item(1, "", &[])).unwrap();
        assert_eq!(out.intro, "Hello");
    }

    #[test]
    fn non_empty_description_wins() {
        let t = template(Some(1), vec![version(1, "Hello", vec![])]);
        let out = resolve_effective_content(&t, &item(1, "Custom", &[])).unwrap();
        assert_eq!(out.intro, "Custom");
    }

    #[test]
    fn missing_intro_everywhere_is_empty() {
        let mut v = version(1, "", vec![]);
        v.intro = None;
        let t = template(Some(1), vec![v]);
        let mut d = item(1, "", &[]);
        d.description = None;
        let out = resolve_effective_content(&t, &d).unwrap();
        assert_eq!(out.intro, "");
        assert!(out.sections.is_empty());
    }

    #[test]
    fn explicit_empty_section_override_is_honoured() {
        let t = template(Some(1), vec![version(1, "", vec![Section::new("s1", "T", "Default")])]);
        let out = resolve_effective_content(&t, &item(1, "", &[("s1", "")])).unwrap();
        assert_eq!(out.sections[0].content, "");
    }

    #[test]
    fn section_without_content_or_override_is_empty() {
        let section = Section {
            key: "s1".into(),
            title: "T".into(),
            content: None,
        };
        let t = template(Some(1), vec![version(1, "", vec![section])]);
        let out = resolve_effective_content(&t, &item(1, "", &[])).unwrap();
        assert_eq!(out.sections[0].content, "");
    }

    #[test]
    fn overrides_never_reorder_add_or_remove_sections() {
        let t = template(
            Some(1),
            vec![version(
                1,
                "",
                vec![
                    Section::new("c", "C", "c0"),
                    Section::new("a", "A", "a0"),
                    Section::new("b", "B", "b0"),
                ],
            )],
        );
        let d = item(1, "", &[("a", "a1"), ("ghost", "boo")]);
        let out = resolve_effective_content(&t, &d).unwrap();

        let keys: Vec<_> = out.sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
        let contents: Vec<_> = out.sections.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["c0", "a1", "b0"]);
    }

    #[test]
    fn stale_keys_are_reported_not_applied() {
        let t = template(Some(1), vec![version(1, "", vec![Section::new("a", "A", "x")])]);
        let d = item(1, "", &[("a", "y"), ("gone", "z")]);
        assert_eq!(stale_override_keys(&t, &d), vec!["gone".to_string()]);
    }

    #[test]
    fn end_to_end_scenario() {
        let t = template(
            Some(2),
            vec![version(2, "T2", vec![Section::new("k1", "A", "base")])],
        );
        let d = item(2, "", &[("k1", "over")]);
        let out = resolve_effective_content(&t, &d).unwrap();

        assert_eq!(out.intro, "T2");
        assert_eq!(
            out.sections,
            vec![EffectiveSection {
                key: "k1".into(),
                title: "A".into(),
                content: "over".into(),
            }]
        );
    }

    #[test]
    fn works_with_published_templates() {
        let mut t = Template::new("t", "owner");
        t.publish_version(
            VersionDraft {
                intro: Some("intro".into()),
                sections: vec![Section::new("k", "K", "body")],
            },
            false,
        )
        .unwrap();
        let out = resolve_effective_content(&t, &ItemDescription::default()).unwrap();
        assert_eq!(out.version, 1);
        assert!(out.fell_back);
    }

    fn arb_item() -> impl Strategy<Value = ItemDescription> {
        (
            0u32..4,
            proptest::option::of("[a-z]{0,3}"),
            proptest::collection::btree_map("[a-d]", "[a-z]{0,3}", 0..4),
        )
            .prop_map(|(template_version, description, overrides)| ItemDescription {
                template_id: None,
                template_version,
                description,
                overrides,
            })
    }

    proptest! {
        #[test]
        fn resolution_is_deterministic(d in arb_item(), active in proptest::option::of(0u32..4)) {
            let mut t = two_versions();
            t.active_version = active;
            let first = resolve_effective_content(&t, &d);
            let second = resolve_effective_content(&t, &d);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn section_count_matches_selected_version(d in arb_item()) {
            let t = two_versions();
            if let Some(out) = resolve_effective_content(&t, &d) {
                let v = t.version(out.version).unwrap();
                prop_assert_eq!(out.sections.len(), v.sections.len());
            }
        }
    }
}
