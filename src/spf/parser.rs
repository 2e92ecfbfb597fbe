use std::net::{Ipv4Addr, Ipv6Addr};

use super::types::{Directive, Mechanism, Qualifier, SpfParseError, SpfRecord};
use super::SpfGrammar;

/// RFC 7208 term grammar.
///
/// Unknown mechanism names are a permanent error unless
/// [`allow_unknown_mechanisms`](SpfParser::allow_unknown_mechanisms) is set,
/// in which case they come out as [`Mechanism::Unknown`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SpfParser {
    allow_unknown: bool,
}

impl SpfParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_unknown_mechanisms(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }
}

impl SpfGrammar for SpfParser {
    fn parse(&self, record: &str) -> Result<SpfRecord, SpfParseError> {
        parse_record(record, self.allow_unknown)
    }
}

impl SpfRecord {
    /// Parse an SPF record string with the default strict grammar.
    pub fn parse(record: &str) -> Result<Self, SpfParseError> {
        SpfParser::new().parse(record)
    }
}

fn parse_record(record: &str, allow_unknown: bool) -> Result<SpfRecord, SpfParseError> {
    let mut terms = record.split_whitespace();

    // Version token, case-insensitive
    let version = terms.next().unwrap_or("");
    if !version.eq_ignore_ascii_case("v=spf1") {
        return Err(SpfParseError::InvalidVersion(version.to_string()));
    }

    let mut directives = Vec::new();
    let mut redirect: Option<String> = None;
    let mut explanation: Option<String> = None;

    for term in terms {
        if let Some((name, value)) = try_parse_modifier(term) {
            match name.to_ascii_lowercase().as_str() {
                "redirect" => {
                    if redirect.is_some() {
                        return Err(SpfParseError::DuplicateModifier(term.to_string()));
                    }
                    if value.is_empty() {
                        return Err(SpfParseError::MissingArgument(term.to_string()));
                    }
                    redirect = Some(value.to_string());
                }
                "exp" => {
                    if explanation.is_some() {
                        return Err(SpfParseError::DuplicateModifier(term.to_string()));
                    }
                    if value.is_empty() {
                        return Err(SpfParseError::MissingArgument(term.to_string()));
                    }
                    explanation = Some(value.to_string());
                }
                _ => {} // Unknown modifier → silently ignore (forward compatibility)
            }
            continue;
        }

        directives.push(parse_directive(term, allow_unknown)?);
    }

    Ok(SpfRecord {
        directives,
        redirect,
        explanation,
    })
}

/// A modifier is `name=value` with name = ALPHA *( ALPHA / DIGIT / "-" / "_" / "." ).
/// Returns None if the term is not a modifier.
fn try_parse_modifier(term: &str) -> Option<(&str, &str)> {
    let (name, value) = term.split_once('=')?;
    let mut chars = name.chars();
    if !chars.next()?.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
        return None;
    }
    if is_known_mechanism_name(&name.to_ascii_lowercase()) {
        return None;
    }
    Some((name, value))
}

fn is_known_mechanism_name(name: &str) -> bool {
    matches!(
        name,
        "all" | "include" | "a" | "mx" | "ptr" | "ip4" | "ip6" | "exists"
    )
}

/// Parse a single directive term: [qualifier]mechanism[:argument][/cidr]
fn parse_directive(term: &str, allow_unknown: bool) -> Result<Directive, SpfParseError> {
    let (qualifier, rest) = extract_qualifier(term);
    let (mech_name, arg) = split_mechanism_arg(rest);

    let mechanism = match mech_name.to_ascii_lowercase().as_str() {
        "all" => {
            if arg.is_some() {
                return Err(SpfParseError::InvalidArgument(term.to_string()));
            }
            Mechanism::All
        }
        "include" => Mechanism::Include {
            domain: required_domain(term, arg)?,
        },
        "exists" => Mechanism::Exists {
            domain: required_domain(term, arg)?,
        },
        "a" => {
            let (domain, cidr4, cidr6) = parse_domain_cidr(term, arg)?;
            Mechanism::A { domain, cidr4, cidr6 }
        }
        "mx" => {
            let (domain, cidr4, cidr6) = parse_domain_cidr(term, arg)?;
            Mechanism::Mx { domain, cidr4, cidr6 }
        }
        "ptr" => {
            if arg.is_some_and(|a| a.starts_with('/')) {
                return Err(SpfParseError::InvalidArgument(term.to_string()));
            }
            Mechanism::Ptr {
                domain: arg.filter(|s| !s.is_empty()).map(str::to_string),
            }
        }
        "ip4" => {
            let arg = arg
                .filter(|a| !a.is_empty())
                .ok_or_else(|| SpfParseError::MissingArgument(term.to_string()))?;
            parse_ip4(term, arg)?
        }
        "ip6" => {
            let arg = arg
                .filter(|a| !a.is_empty())
                .ok_or_else(|| SpfParseError::MissingArgument(term.to_string()))?;
            parse_ip6(term, arg)?
        }
        _ if allow_unknown && !mech_name.is_empty() => Mechanism::Unknown {
            raw: rest.to_string(),
        },
        _ => return Err(SpfParseError::UnknownMechanism(term.to_string())),
    };

    Ok(Directive { qualifier, mechanism })
}

fn required_domain(term: &str, arg: Option<&str>) -> Result<String, SpfParseError> {
    match arg {
        Some(domain) if domain.starts_with('/') => {
            Err(SpfParseError::InvalidArgument(term.to_string()))
        }
        Some(domain) if !domain.is_empty() => Ok(domain.to_string()),
        _ => Err(SpfParseError::MissingArgument(term.to_string())),
    }
}

/// Extract qualifier prefix if present, default to Pass.
fn extract_qualifier(term: &str) -> (Qualifier, &str) {
    if let Some(first) = term.chars().next() {
        if let Some(q) = Qualifier::from_char(first) {
            return (q, &term[1..]);
        }
    }
    (Qualifier::Pass, term)
}

/// Split "mechanism:argument" or "mechanism/cidr". The arg after ':' excludes
/// the colon; an arg starting at '/' keeps the slash.
fn split_mechanism_arg(s: &str) -> (&str, Option<&str>) {
    let colon = s.find(':');
    let slash = s.find('/');
    match (colon, slash) {
        (Some(c), Some(sl)) if sl < c => (&s[..sl], Some(&s[sl..])),
        (Some(c), _) => (&s[..c], Some(&s[c + 1..])),
        (None, Some(sl)) => (&s[..sl], Some(&s[sl..])),
        (None, None) => (s, None),
    }
}

/// Parse "domain/cidr4//cidr6" or "/cidr4//cidr6" or "//cidr6" etc.
fn parse_domain_cidr(
    term: &str,
    arg: Option<&str>,
) -> Result<(Option<String>, Option<u8>, Option<u8>), SpfParseError> {
    let s = match arg {
        None => return Ok((None, None, None)),
        Some("") => return Err(SpfParseError::MissingArgument(term.to_string())),
        Some(s) => s,
    };

    let (before_dslash, cidr6) = match s.find("//") {
        Some(pos) => (&s[..pos], Some(parse_prefix(term, &s[pos + 2..], 128)?)),
        None => (s, None),
    };

    let (domain_part, cidr4) = match before_dslash.rfind('/') {
        Some(pos) => (
            &before_dslash[..pos],
            Some(parse_prefix(term, &before_dslash[pos + 1..], 32)?),
        ),
        None => (before_dslash, None),
    };

    let domain = if domain_part.is_empty() {
        None
    } else {
        Some(domain_part.to_string())
    };
    Ok((domain, cidr4, cidr6))
}

fn parse_prefix(term: &str, s: &str, max: u8) -> Result<u8, SpfParseError> {
    // No sign or leading zeros, per the ip4-cidr-length / ip6-cidr-length ABNF
    if s.is_empty()
        || !s.bytes().all(|b| b.is_ascii_digit())
        || (s.len() > 1 && s.starts_with('0'))
    {
        return Err(SpfParseError::InvalidCidr(term.to_string()));
    }
    match s.parse::<u8>() {
        Ok(v) if v <= max => Ok(v),
        _ => Err(SpfParseError::InvalidCidr(term.to_string())),
    }
}

/// Parse ip4:addr or ip4:addr/prefix
fn parse_ip4(term: &str, arg: &str) -> Result<Mechanism, SpfParseError> {
    let (addr_str, prefix) = match arg.split_once('/') {
        Some((addr, p)) => (addr, Some(parse_prefix(term, p, 32)?)),
        None => (arg, None),
    };
    let addr: Ipv4Addr = addr_str
        .parse()
        .map_err(|_| SpfParseError::InvalidAddress(term.to_string()))?;
    Ok(Mechanism::Ip4 { addr, prefix })
}

/// Parse ip6:addr or ip6:addr/prefix
fn parse_ip6(term: &str, arg: &str) -> Result<Mechanism, SpfParseError> {
    // IPv6 addresses contain colons; the prefix is after the last '/'
    let (addr_str, prefix) = match arg.rsplit_once('/') {
        Some((addr, p)) => (addr, Some(parse_prefix(term, p, 128)?)),
        None => (arg, None),
    };
    let addr: Ipv6Addr = addr_str
        .parse()
        .map_err(|_| SpfParseError::InvalidAddress(term.to_string()))?;
    Ok(Mechanism::Ip6 { addr, prefix })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_record() {
        let rec = SpfRecord::parse("v=spf1 -all").unwrap();
        assert_eq!(rec.directives.len(), 1);
        assert_eq!(rec.directives[0].qualifier, Qualifier::Fail);
        assert_eq!(rec.directives[0].mechanism, Mechanism::All);
        assert!(rec.redirect.is_none());
        assert!(rec.explanation.is_none());
    }

    #[test]
    fn parse_bare_version() {
        let rec = SpfRecord::parse("v=spf1").unwrap();
        assert!(rec.directives.is_empty());
    }

    #[test]
    fn parse_multiple_mechanisms() {
        let rec = SpfRecord::parse("v=spf1 ip4:192.0.2.0/24 ip4:198.51.100.0/24 -all").unwrap();
        assert_eq!(rec.directives.len(), 3);
        assert_eq!(rec.directives[0].qualifier, Qualifier::Pass);
        assert_eq!(
            rec.directives[0].mechanism,
            Mechanism::Ip4 {
                addr: "192.0.2.0".parse().unwrap(),
                prefix: Some(24)
            }
        );
        assert_eq!(rec.directives[2].qualifier, Qualifier::Fail);
    }

    #[test]
    fn parse_all_mechanism_types() {
        let rec = SpfRecord::parse(
            "v=spf1 +all ~include:ex.com a a:d.com mx:d.com/24 ptr ptr:d.com ip4:1.2.3.4 ip6:::1 exists:d.com -all",
        )
        .unwrap();
        assert_eq!(rec.directives.len(), 11);
        assert_eq!(rec.directives[0].qualifier, Qualifier::Pass);
        assert_eq!(
            rec.directives[1].mechanism,
            Mechanism::Include { domain: "ex.com".into() }
        );
        assert_eq!(rec.directives[1].qualifier, Qualifier::SoftFail);
        assert_eq!(
            rec.directives[2].mechanism,
            Mechanism::A { domain: None, cidr4: None, cidr6: None }
        );
        assert_eq!(
            rec.directives[4].mechanism,
            Mechanism::Mx { domain: Some("d.com".into()), cidr4: Some(24), cidr6: None }
        );
        assert_eq!(rec.directives[5].mechanism, Mechanism::Ptr { domain: None });
        assert_eq!(
            rec.directives[6].mechanism,
            Mechanism::Ptr { domain: Some("d.com".into()) }
        );
        assert_eq!(
            rec.directives[8].mechanism,
            Mechanism::Ip6 { addr: "::1".parse().unwrap(), prefix: None }
        );
        assert_eq!(
            rec.directives[9].mechanism,
            Mechanism::Exists { domain: "d.com".into() }
        );
    }

    #[test]
    fn parse_macros_in_domain() {
        let rec = SpfRecord::parse("v=spf1 exists:%{ir}.sbl.example.com -all").unwrap();
        assert_eq!(
            rec.directives[0].mechanism,
            Mechanism::Exists { domain: "%{ir}.sbl.example.com".into() }
        );
    }

    #[test]
    fn parse_case_insensitive() {
        let rec = SpfRecord::parse("V=SPF1 IP4:192.0.2.1 -ALL").unwrap();
        assert_eq!(rec.directives.len(), 2);
        assert_eq!(rec.directives[1].mechanism, Mechanism::All);
    }

    #[test]
    fn invalid_version() {
        let err = SpfRecord::parse("v=spf2 -all").unwrap_err();
        assert_eq!(err, SpfParseError::InvalidVersion("v=spf2".into()));
        assert!(SpfRecord::parse("").is_err());
        assert!(SpfRecord::parse("v=spf10 -all").is_err());
    }

    #[test]
    fn a_mx_dual_cidr() {
        let rec = SpfRecord::parse("v=spf1 a/24 mx//64 a:d.com/24//64").unwrap();
        assert_eq!(
            rec.directives[0].mechanism,
            Mechanism::A { domain: None, cidr4: Some(24), cidr6: None }
        );
        assert_eq!(
            rec.directives[1].mechanism,
            Mechanism::Mx { domain: None, cidr4: None, cidr6: Some(64) }
        );
        assert_eq!(
            rec.directives[2].mechanism,
            Mechanism::A { domain: Some("d.com".into()), cidr4: Some(24), cidr6: Some(64) }
        );
    }

    #[test]
    fn cidr_out_of_range() {
        assert!(matches!(
            SpfRecord::parse("v=spf1 ip4:1.2.3.4/33"),
            Err(SpfParseError::InvalidCidr(t)) if t == "ip4:1.2.3.4/33"
        ));
        assert!(SpfRecord::parse("v=spf1 ip6:::1/129").is_err());
        assert!(SpfRecord::parse("v=spf1 a/33").is_err());
        assert!(SpfRecord::parse("v=spf1 mx//200").is_err());
        assert!(SpfRecord::parse("v=spf1 ip4:1.2.3.4/024").is_err());
    }

    #[test]
    fn bad_addresses() {
        assert!(matches!(
            SpfRecord::parse("v=spf1 ip4:999.1.1.1"),
            Err(SpfParseError::InvalidAddress(_))
        ));
        assert!(matches!(
            SpfRecord::parse("v=spf1 ip6:zzzz::1"),
            Err(SpfParseError::InvalidAddress(_))
        ));
        assert!(matches!(
            SpfRecord::parse("v=spf1 ip4"),
            Err(SpfParseError::MissingArgument(_))
        ));
    }

    #[test]
    fn missing_domain_arguments() {
        assert!(matches!(
            SpfRecord::parse("v=spf1 include: -all"),
            Err(SpfParseError::MissingArgument(t)) if t == "include:"
        ));
        assert!(SpfRecord::parse("v=spf1 exists").is_err());
        assert!(SpfRecord::parse("v=spf1 a: -all").is_err());
    }

    #[test]
    fn all_takes_no_argument() {
        assert!(matches!(
            SpfRecord::parse("v=spf1 all:example.com"),
            Err(SpfParseError::InvalidArgument(_))
        ));
    }

    #[test]
    fn modifiers() {
        let rec = SpfRecord::parse("v=spf1 mx redirect=_spf.example.com exp=explain.example.com")
            .unwrap();
        assert_eq!(rec.directives.len(), 1);
        assert_eq!(rec.redirect.as_deref(), Some("_spf.example.com"));
        assert_eq!(rec.explanation.as_deref(), Some("explain.example.com"));
    }

    #[test]
    fn duplicate_modifiers() {
        assert!(matches!(
            SpfRecord::parse("v=spf1 redirect=a.com redirect=b.com"),
            Err(SpfParseError::DuplicateModifier(_))
        ));
        assert!(SpfRecord::parse("v=spf1 exp=a.com exp=b.com").is_err());
    }

    #[test]
    fn unknown_modifier_ignored() {
        let rec = SpfRecord::parse("v=spf1 foo-bar.baz=qux -all").unwrap();
        assert_eq!(rec.directives.len(), 1);
    }

    #[test]
    fn unknown_mechanism_strict() {
        let err = SpfRecord::parse("v=spf1 foo:bar -all").unwrap_err();
        assert_eq!(err, SpfParseError::UnknownMechanism("foo:bar".into()));
    }

    #[test]
    fn unknown_mechanism_lenient() {
        let rec = SpfParser::new()
            .allow_unknown_mechanisms(true)
            .parse("v=spf1 ?foo:bar -all")
            .unwrap();
        assert_eq!(rec.directives.len(), 2);
        assert_eq!(rec.directives[0].qualifier, Qualifier::Neutral);
        assert_eq!(
            rec.directives[0].mechanism,
            Mechanism::Unknown { raw: "foo:bar".into() }
        );
    }

    #[test]
    fn lenient_parser_still_rejects_bare_qualifier() {
        let parser = SpfParser::new().allow_unknown_mechanisms(true);
        assert!(parser.parse("v=spf1 - -all").is_err());
    }

    #[test]
    fn extra_whitespace() {
        let rec = SpfRecord::parse("  v=spf1   a \t mx   -all  ").unwrap();
        assert_eq!(rec.directives.len(), 3);
    }
}
