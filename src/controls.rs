//! Parsing of filter/pagination inputs. `None` always means "unset" (or, for the
//! page box, "keep the previous value").

use crate::model::{Level, SchemaVersion, Worker};

/// Value used by the "-----" option of the select boxes.
pub const UNSET: &str = "";

pub fn parse_page(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|p| *p >= 1)
}

/// Text to show in the page box once editing ends: the input if it is a valid
/// page, otherwise the page the query actually uses.
pub fn normalize_page_input(input: &str, current: u32) -> String {
    match parse_page(input) {
        Some(page) => page.to_string(),
        None => current.max(1).to_string(),
    }
}

pub fn parse_level_choice(input: &str, schema: SchemaVersion) -> Option<Level> {
    Level::from_string(input).filter(|l| schema.supports_level(*l))
}

/// Accepts the option value (a code) or a tag.
pub fn parse_worker_choice(input: &str) -> Option<Worker> {
    let input = input.trim();
    match input.parse::<i64>() {
        Ok(code) => Worker::from_code(code),
        Err(_) => Worker::from_tag(input),
    }
}

pub fn level_option_value(level: Option<Level>) -> String {
    level.map(|l| l.name().to_string()).unwrap_or_else(|| UNSET.to_string())
}

pub fn worker_option_value(worker: Option<Worker>) -> String {
    worker.map(|w| w.code().to_string()).unwrap_or_else(|| UNSET.to_string())
}

/// Label of the fetch button: `page | worker | level`.
pub fn query_summary(page: u32, level: Option<Level>, worker: Option<Worker>) -> String {
    format!(
        "{} | {} | {}",
        page,
        worker.map(|w| w.display_name()).unwrap_or("any worker"),
        level.map(|l| l.display_name()).unwrap_or("any level"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_input() {
        assert_eq!(parse_page(" 4 "), Some(4));
        assert_eq!(parse_page("0"), None);
        assert_eq!(parse_page("-2"), None);
        assert_eq!(parse_page("abc"), None);
        assert_eq!(parse_page(""), None);
    }

    #[test]
    fn invalid_page_input_snaps_back_to_query_page() {
        assert_eq!(normalize_page_input("0", 3), "3");
        assert_eq!(normalize_page_input("abc", 3), "3");
        assert_eq!(normalize_page_input(" 7 ", 3), "7");
        assert_eq!(normalize_page_input("", 0), "1");
    }

    #[test]
    fn level_choice_respects_schema() {
        assert_eq!(parse_level_choice("error", SchemaVersion::V1), Some(Level::Error));
        assert_eq!(parse_level_choice("error", SchemaVersion::V2), None);
        assert_eq!(parse_level_choice(UNSET, SchemaVersion::V1), None);
        assert_eq!(parse_level_choice("-----", SchemaVersion::V1), None);
    }

    #[test]
    fn worker_choice_by_code_or_tag() {
        assert_eq!(parse_worker_choice("1"), Some(Worker::Strategy));
        assert_eq!(parse_worker_choice("api"), Some(Worker::Api));
        assert_eq!(parse_worker_choice("7"), None);
        assert_eq!(parse_worker_choice(UNSET), None);
    }

    #[test]
    fn option_values_round_trip_through_parsers() {
        for w in Worker::ALL {
            assert_eq!(parse_worker_choice(&worker_option_value(Some(w))), Some(w));
        }
        for l in SchemaVersion::V1.levels() {
            assert_eq!(parse_level_choice(&level_option_value(Some(l)), SchemaVersion::V1), Some(l));
        }
    }

    #[test]
    fn summary_label() {
        assert_eq!(query_summary(2, Some(Level::Warn), None), "2 | any worker | Warn");
    }
}
