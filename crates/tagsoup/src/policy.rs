//! Per-tag-name parsing policy.
//!
//! Pure, stateless lookup over an immutable table. The table reproduces the
//! published legacy list; tags outside it get [`ElementPolicy::DEFAULT`].

use phf::phf_map;

/// What the parser expects for an element's end tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndTagRule {
    /// A matching close tag is expected (though recovery tolerates its absence).
    Required,
    /// The close tag may be omitted; a repeated same-name start tag or a tag
    /// from the stop set implies it.
    Optional,
    /// The element never has a close tag and never takes children.
    Forbidden,
}

/// Immutable parsing metadata for one tag name.
#[derive(Clone, Copy, Debug)]
pub struct ElementPolicy {
    /// Whether child elements are parsed; when false, content is scanned as
    /// raw text up to the matching close tag.
    pub children_allowed: bool,
    pub end_tag: EndTagRule,
    /// Start tags that force this element closed while scanning its children.
    pub implied_closers: Option<&'static [&'static str]>,
    /// Whether `&…;` spans are decoded in this element's text content.
    pub entities_decoded: bool,
    /// Content is scanned as opaque text and discarded when scripting is
    /// enabled (NOSCRIPT); parsed as ordinary markup otherwise.
    pub scripting_opaque: bool,
}

impl ElementPolicy {
    /// Policy for any tag missing from the table.
    pub const DEFAULT: ElementPolicy = ElementPolicy {
        children_allowed: true,
        end_tag: EndTagRule::Required,
        implied_closers: None,
        entities_decoded: true,
        scripting_opaque: false,
    };

    const fn optional_end() -> ElementPolicy {
        ElementPolicy {
            end_tag: EndTagRule::Optional,
            ..ElementPolicy::DEFAULT
        }
    }

    const fn forbidden_end() -> ElementPolicy {
        ElementPolicy {
            children_allowed: false,
            end_tag: EndTagRule::Forbidden,
            ..ElementPolicy::DEFAULT
        }
    }

    const fn text_only(entities_decoded: bool) -> ElementPolicy {
        ElementPolicy {
            children_allowed: false,
            entities_decoded,
            ..ElementPolicy::DEFAULT
        }
    }

    const fn stopped_by(closers: &'static [&'static str]) -> ElementPolicy {
        ElementPolicy {
            end_tag: EndTagRule::Optional,
            implied_closers: Some(closers),
            ..ElementPolicy::DEFAULT
        }
    }
}

static POLICIES: phf::Map<&'static str, ElementPolicy> = phf_map! {
    "NOSCRIPT" => ElementPolicy {
        scripting_opaque: true,
        ..ElementPolicy::DEFAULT
    },

    "SCRIPT" => ElementPolicy::text_only(false),
    "STYLE" => ElementPolicy::text_only(false),
    "TEXTAREA" => ElementPolicy::text_only(true),

    "IMG" => ElementPolicy::forbidden_end(),
    "META" => ElementPolicy::forbidden_end(),
    "LINK" => ElementPolicy::forbidden_end(),
    "BASE" => ElementPolicy::forbidden_end(),
    "INPUT" => ElementPolicy::forbidden_end(),
    "FRAME" => ElementPolicy::forbidden_end(),
    "BR" => ElementPolicy::forbidden_end(),
    "HR" => ElementPolicy::forbidden_end(),
    "EMBED" => ElementPolicy::forbidden_end(),
    "SPACER" => ElementPolicy::forbidden_end(),

    "P" => ElementPolicy::stopped_by(&["P", "DIV", "TABLE", "PRE", "UL", "OL"]),
    "LI" => ElementPolicy::optional_end(),
    "DT" => ElementPolicy::optional_end(),
    "DD" => ElementPolicy::optional_end(),
    "TR" => ElementPolicy::optional_end(),
    "TH" => ElementPolicy::stopped_by(&["TH", "TD", "TR"]),
    "TD" => ElementPolicy::stopped_by(&["TH", "TD", "TR"]),
    "HEAD" => ElementPolicy::stopped_by(&["BODY", "DIV", "SPAN", "TABLE"]),
    "OPTION" => ElementPolicy::stopped_by(&["OPTION", "SELECT"]),

    // Browsers treat anchor close tags as optional even though the standard
    // marks them required.
    "A" => ElementPolicy::optional_end(),
    "ANCHOR" => ElementPolicy::optional_end(),
};

/// Looks up the policy for an upper-cased tag name.
pub fn get_policy(upper_tag_name: &str) -> Option<&'static ElementPolicy> {
    POLICIES.get(upper_tag_name)
}

/// Whether entities are decoded in the content of the named element.
pub fn is_entity_decoding_enabled(tag_name: &str) -> bool {
    get_policy(tag_name.to_ascii_uppercase().as_str())
        .map_or(true, |policy| policy.entities_decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tag_gets_default() {
        assert!(get_policy("DIV").is_none());
        let policy = ElementPolicy::DEFAULT;
        assert!(policy.children_allowed);
        assert_eq!(policy.end_tag, EndTagRule::Required);
        assert!(policy.entities_decoded);
    }

    #[test]
    fn raw_text_elements_skip_entity_decoding() {
        assert!(!is_entity_decoding_enabled("script"));
        assert!(!is_entity_decoding_enabled("STYLE"));
        assert!(is_entity_decoding_enabled("textarea"));
        assert!(is_entity_decoding_enabled("div"));
    }

    #[test]
    fn table_cells_stop_on_row_and_cell_tags() {
        let td = get_policy("TD").expect("TD policy");
        assert_eq!(td.end_tag, EndTagRule::Optional);
        assert_eq!(td.implied_closers, Some(&["TH", "TD", "TR"][..]));
    }

    #[test]
    fn forbidden_end_elements_take_no_children() {
        for tag in ["IMG", "META", "LINK", "BASE", "INPUT", "FRAME", "BR", "HR", "EMBED", "SPACER"] {
            let policy = get_policy(tag).expect("policy");
            assert_eq!(policy.end_tag, EndTagRule::Forbidden, "{tag}");
            assert!(!policy.children_allowed, "{tag}");
        }
    }

    #[test]
    fn noscript_is_opaque_under_scripting() {
        let policy = get_policy("NOSCRIPT").expect("policy");
        assert!(policy.scripting_opaque);
        assert!(policy.children_allowed);
        assert_eq!(policy.end_tag, EndTagRule::Required);
    }
}
