//! 필터 폼과 URL 쿼리 파라미터 간 변환
//!
//! | 키 | 값 |
//! |---|---|
//! | `keyword` | 검색어 |
//! | `date` | `YYYY-MM-DD` |
//! | `status`, `env`, `datasets`, `exec`, `camp`, `tags` | 쉼표로 연결한 id 목록 |
//!
//! 파싱은 실패하지 않습니다. 해석할 수 없는 값은 해당 조건이 없는 것으로 취급합니다.

use std::collections::BTreeMap;

use chutney_core::types::{ExecutionStatus, StatusLabels};

use super::{ExecutionFilter, FilterDate, SelectOption};

/// 쿼리 파라미터 맵 (키 순서가 고정되어 비교가 결정적입니다)
pub type QueryParams = BTreeMap<String, String>;

pub const KEY_KEYWORD: &str = "keyword";
pub const KEY_DATE: &str = "date";
pub const KEY_STATUS: &str = "status";
pub const KEY_ENVIRONMENT: &str = "env";
pub const KEY_DATASETS: &str = "datasets";
pub const KEY_EXECUTORS: &str = "exec";
pub const KEY_CAMPAIGNS: &str = "camp";
pub const KEY_TAGS: &str = "tags";

const LIST_SEPARATOR: char = ',';

/// 쿼리 파라미터로부터 필터 폼을 만듭니다.
///
/// 상태 옵션의 표시 이름은 `labels`로 해석하고, 나머지 패싯은 id를 그대로 표시 이름으로 씁니다.
pub fn from_query_params(params: &QueryParams, labels: &dyn StatusLabels) -> ExecutionFilter {
    ExecutionFilter {
        keyword: params
            .get(KEY_KEYWORD)
            .filter(|keyword| !keyword.is_empty())
            .cloned(),
        date: params.get(KEY_DATE).and_then(|raw| parse_date(raw)),
        status: split_ids(params.get(KEY_STATUS))
            .map(|id| status_option(id, labels))
            .collect(),
        environments: plain_options(params.get(KEY_ENVIRONMENT)),
        datasets: plain_options(params.get(KEY_DATASETS)),
        executors: plain_options(params.get(KEY_EXECUTORS)),
        campaigns: plain_options(params.get(KEY_CAMPAIGNS)),
        tags: plain_options(params.get(KEY_TAGS)),
    }
}

/// 필터 폼을 쿼리 파라미터로 직렬화합니다. 비어 있는 조건의 키는 생략합니다.
pub fn to_query_params(filter: &ExecutionFilter) -> QueryParams {
    let mut params = QueryParams::new();

    if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.is_empty()) {
        params.insert(KEY_KEYWORD.to_owned(), keyword.to_owned());
    }
    if let Some(date) = filter.date {
        params.insert(KEY_DATE.to_owned(), format_date(date));
    }

    let lists = [
        (KEY_STATUS, &filter.status),
        (KEY_ENVIRONMENT, &filter.environments),
        (KEY_DATASETS, &filter.datasets),
        (KEY_EXECUTORS, &filter.executors),
        (KEY_CAMPAIGNS, &filter.campaigns),
        (KEY_TAGS, &filter.tags),
    ];
    for (key, options) in lists {
        if let Some(joined) = join_ids(options) {
            params.insert(key.to_owned(), joined);
        }
    }

    params
}

/// `YYYY-MM-DD` 문자열을 필터 날짜로 해석합니다.
///
/// `-`로 나눈 세 필드를 `[연, 월, 일]`로 읽으며, 필드 수가 다르거나
/// 달력에 없는 날짜이면 `None`입니다.
pub fn parse_date(raw: &str) -> Option<FilterDate> {
    let raw = raw.trim();
    // 음수 연도는 다루지 않습니다
    let mut fields = raw.split('-');
    let year = fields.next()?.trim().parse::<i32>().ok()?;
    let month = fields.next()?.trim().parse::<u32>().ok()?;
    let day = fields.next()?.trim().parse::<u32>().ok()?;
    if fields.next().is_some() {
        return None;
    }

    let date = FilterDate::new(year, month, day);
    date.to_naive().map(|_| date)
}

/// 필터 날짜를 `YYYY-MM-DD` 문자열로 직렬화합니다.
pub fn format_date(date: FilterDate) -> String {
    date.to_string()
}

fn split_ids(raw: Option<&String>) -> impl Iterator<Item = &str> {
    raw.map(String::as_str)
        .unwrap_or_default()
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

fn plain_options(raw: Option<&String>) -> Vec<SelectOption> {
    split_ids(raw).map(SelectOption::plain).collect()
}

fn status_option(id: &str, labels: &dyn StatusLabels) -> SelectOption {
    match id.parse::<ExecutionStatus>() {
        Ok(status) => SelectOption::new(status.as_str(), labels.label(status)),
        Err(()) => SelectOption::plain(id),
    }
}

fn join_ids(options: &[SelectOption]) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let ids: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
    Some(ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chutney_core::types::EnglishStatusLabels;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn parses_every_key() {
        let filter = from_query_params(
            &params(&[
                ("keyword", "login"),
                ("date", "2024-03-07"),
                ("status", "SUCCESS,FAILURE"),
                ("env", "QA,PROD"),
                ("datasets", "users"),
                ("exec", "alice"),
                ("camp", "nightly"),
                ("tags", "smoke,api"),
            ]),
            &EnglishStatusLabels,
        );

        assert_eq!(filter.keyword.as_deref(), Some("login"));
        assert_eq!(filter.date, Some(FilterDate::new(2024, 3, 7)));
        assert_eq!(
            filter.status,
            vec![
                SelectOption::new("SUCCESS", "Success"),
                SelectOption::new("FAILURE", "Failure"),
            ]
        );
        assert_eq!(
            filter.environments,
            vec![SelectOption::plain("QA"), SelectOption::plain("PROD")]
        );
        assert_eq!(filter.datasets, vec![SelectOption::plain("users")]);
        assert_eq!(filter.executors, vec![SelectOption::plain("alice")]);
        assert_eq!(filter.campaigns, vec![SelectOption::plain("nightly")]);
        assert_eq!(
            filter.tags,
            vec![SelectOption::plain("smoke"), SelectOption::plain("api")]
        );
    }

    #[test]
    fn missing_keys_mean_no_constraint() {
        let filter = from_query_params(&QueryParams::new(), &EnglishStatusLabels);
        assert!(filter.is_empty());
    }

    #[test]
    fn unknown_status_keeps_raw_id_as_label() {
        let filter = from_query_params(&params(&[("status", "EXPLODED")]), &EnglishStatusLabels);
        assert_eq!(filter.status, vec![SelectOption::plain("EXPLODED")]);
    }

    #[test]
    fn empty_list_entries_are_ignored() {
        let filter = from_query_params(&params(&[("tags", ",smoke,,")]), &EnglishStatusLabels);
        assert_eq!(filter.tags, vec![SelectOption::plain("smoke")]);
    }

    #[test]
    fn malformed_date_degrades_to_no_constraint() {
        for raw in ["", "2024", "2024-01", "2024-13-01", "2024-02-30", "x-y-z", "2024-01-01-01"] {
            let filter = from_query_params(&params(&[("date", raw)]), &EnglishStatusLabels);
            assert_eq!(filter.date, None, "date {raw:?} should be ignored");
        }
    }

    #[test]
    fn unpadded_date_is_accepted() {
        assert_eq!(parse_date("2024-3-7"), Some(FilterDate::new(2024, 3, 7)));
    }

    #[test]
    fn serializes_only_non_empty_keys() {
        let filter = ExecutionFilter {
            keyword: Some(String::new()),
            date: Some(FilterDate::new(2024, 1, 5)),
            tags: vec![SelectOption::plain("a"), SelectOption::plain("b")],
            ..Default::default()
        };

        let out = to_query_params(&filter);
        assert_eq!(out, params(&[("date", "2024-01-05"), ("tags", "a,b")]));
    }

    #[test]
    fn status_serializes_ids_not_labels() {
        let filter = ExecutionFilter {
            status: vec![SelectOption::new("NOT_EXECUTED", "Not executed")],
            ..Default::default()
        };
        assert_eq!(
            to_query_params(&filter).get("status").map(String::as_str),
            Some("NOT_EXECUTED")
        );
    }

    #[test]
    fn params_round_trip_through_filter() {
        let original = params(&[
            ("camp", "nightly"),
            ("date", "2023-11-30"),
            ("env", "QA"),
            ("keyword", "timeout"),
            ("status", "WARN,STOPPED"),
        ]);
        let filter = from_query_params(&original, &EnglishStatusLabels);
        assert_eq!(to_query_params(&filter), original);
    }
}
