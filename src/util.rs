/// `base` followed by the non-empty `segments`, each trimmed of slashes.
pub(crate) fn service_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
    {
        url.push('/');
        url.push_str(segment);
    }
    url
}

pub(crate) fn count_digits(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Dataset catalog keys look like `countries-2020`; the year is the last token.
pub(crate) fn year_from_key(key: &str) -> &str {
    key.rsplit('-').next().unwrap_or(key)
}

/// Last path segment of a metadata or documentation link.
pub(crate) fn link_file_name(link: &str) -> Option<&str> {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    let name = path.rsplit_once('/').map_or(path, |(_, name)| name);
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_url_keeps_single_slash() {
        assert_eq!(
            service_url("https://host/distribution/v2/", &["nuts", "/datasets.json"]),
            "https://host/distribution/v2/nuts/datasets.json"
        );
        assert_eq!(
            service_url("https://host/v2", &["countries", "distribution", "", "RO.geojson"]),
            "https://host/v2/countries/distribution/RO.geojson"
        );
    }

    #[test]
    fn digits_and_years() {
        assert_eq!(year_from_key("nuts-2021"), "2021");
        assert_eq!(year_from_key("2016"), "2016");
        assert_eq!(count_digits("RO21"), 2);
        assert_eq!(count_digits("RO"), 0);
    }

    #[test]
    fn file_name_from_link() {
        assert_eq!(
            link_file_name("https://host/meta/NUTS_2021.pdf?x=1"),
            Some("NUTS_2021.pdf")
        );
        assert_eq!(link_file_name("https://host/doc.txt#top"), Some("doc.txt"));
        assert_eq!(link_file_name("https://host/"), None);
    }
}
