/*!
Distinguished-name helpers for mailmender.

This module centralizes:
- Splitting a DN into its RDN components (tolerating escaped commas)
- Checking whether a DN names a given attribute (the "is this a user
  entry" gate)
- Extracting the value of a named RDN attribute

Parsing here is deliberately shallow: it understands `attr=value`
components and `\,` escapes, which covers the DNs a remediation pass
sees in practice. A full RFC 4514 parser is not warranted.
*/

/// Split a DN into RDN components, honoring `\,` escapes.
pub fn split_rdns(dn: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in dn.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            current.push(ch);
            escaped = true;
        } else if ch == ',' {
            out.push(current.trim().to_string());
            current = String::new();
        } else {
            current.push(ch);
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

/// True if any RDN component of the DN uses the given attribute name
/// (case-insensitive). `uid=jdoe,ou=people,dc=example,dc=edu` names
/// `uid`; `ou=fluid-team,dc=example,dc=edu` does not.
pub fn dn_names_attribute(dn: &str, attribute: &str) -> bool {
    split_rdns(dn).iter().any(|rdn| {
        rdn.split_once('=')
            .is_some_and(|(attr, _)| attr.trim().eq_ignore_ascii_case(attribute))
    })
}

/// Value of the first RDN component using the given attribute, if any.
pub fn rdn_value(dn: &str, attribute: &str) -> Option<String> {
    split_rdns(dn).iter().find_map(|rdn| {
        rdn.split_once('=').and_then(|(attr, value)| {
            if attr.trim().eq_ignore_ascii_case(attribute) {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_basic() {
        let rdns = split_rdns("uid=jdoe,ou=people,dc=example,dc=edu");
        assert_eq!(rdns, vec!["uid=jdoe", "ou=people", "dc=example", "dc=edu"]);
    }

    #[test]
    fn split_escaped_comma() {
        let rdns = split_rdns(r"cn=Doe\, Jane,ou=people,dc=example,dc=edu");
        assert_eq!(rdns[0], r"cn=Doe\, Jane");
        assert_eq!(rdns.len(), 4);
    }

    #[test]
    fn names_attribute_matches_component_not_substring() {
        assert!(dn_names_attribute(
            "uid=jdoe,ou=people,dc=example,dc=edu",
            "uid"
        ));
        assert!(dn_names_attribute(
            "UID=jdoe,ou=people,dc=example,dc=edu",
            "uid"
        ));
        // "fluid" contains "uid" but is not a uid component.
        assert!(!dn_names_attribute("ou=fluid-team,dc=example,dc=edu", "uid"));
        assert!(!dn_names_attribute("ou=people,dc=example,dc=edu", "uid"));
    }

    #[test]
    fn rdn_value_extraction() {
        assert_eq!(
            rdn_value("uid=jdoe,ou=people,dc=example,dc=edu", "uid").as_deref(),
            Some("jdoe")
        );
        assert_eq!(rdn_value("ou=people,dc=example,dc=edu", "uid"), None);
    }
}
