use clap::Parser;
use series_reporter::TimeUnit;

#[derive(Parser, Debug)]
#[command(about, long_about, version)]
pub struct Cli {
    #[arg(
        long,
        env = "SERIES_REPORTER_URL",
        help = "Collector endpoint the series is POSTed to, e.g. http://collector:8080/api/v1/series"
    )]
    pub url: String,

    #[arg(
        long,
        env = "SERIES_REPORTER_HOST",
        help = "Host reported with every observation"
    )]
    pub host: Option<String>,

    #[arg(long, env = "SERIES_REPORTER_ENV", help = "Adds an env:<value> tag")]
    pub env: Option<String>,

    #[arg(long, env = "SERIES_REPORTER_GROUP", help = "Adds a group:<value> tag")]
    pub group: Option<String>,

    #[arg(
        long,
        env = "SERIES_REPORTER_APPLICATION",
        help = "Adds an application:<value> tag"
    )]
    pub application: Option<String>,

    #[arg(
        long = "tag",
        value_name = "LABEL:VALUE",
        help = "Extra tag attached to every observation, may be repeated"
    )]
    pub tags: Vec<String>,

    #[arg(
        long,
        env = "SERIES_REPORTER_PERIOD_SECS",
        default_value = "60",
        help = "Seconds between two reporting cycles"
    )]
    pub period_secs: u64,

    #[arg(long, help = "Stop after this many seconds instead of running forever")]
    pub run_for_secs: Option<u64>,

    #[arg(
        long,
        default_value = "seconds",
        help = "Unit rates are expressed in, e.g. 's' or 'minutes'"
    )]
    pub rate_unit: TimeUnit,

    #[arg(
        long,
        default_value = "milliseconds",
        help = "Unit durations are expressed in, e.g. 'ms' or 'us'"
    )]
    pub duration_unit: TimeUnit,

    #[arg(
        long,
        help = "Resolve jvm.* runtime metric names into tagged families",
        default_value_t = false,
        action = clap::ArgAction::Set
    )]
    pub runtime_resolvers: bool,
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["series-reporter", "--url", "http://localhost:8080/series"])
            .expect("should parse");
        assert_eq!(cli.url, "http://localhost:8080/series");
        assert_eq!(cli.period_secs, 60);
        assert_eq!(cli.rate_unit, TimeUnit::Seconds);
        assert_eq!(cli.duration_unit, TimeUnit::Milliseconds);
        assert!(cli.tags.is_empty());
        assert!(!cli.runtime_resolvers);
    }

    #[test]
    fn parses_repeated_tags_and_units() {
        let cli = Cli::try_parse_from([
            "series-reporter",
            "--url",
            "http://localhost:8080/series",
            "--tag",
            "region:eu",
            "--tag",
            "team:core",
            "--rate-unit",
            "m",
            "--duration-unit",
            "us",
            "--runtime-resolvers",
            "true",
        ])
        .expect("should parse");
        assert_eq!(cli.tags, vec!["region:eu".to_string(), "team:core".to_string()]);
        assert_eq!(cli.rate_unit, TimeUnit::Minutes);
        assert_eq!(cli.duration_unit, TimeUnit::Microseconds);
        assert!(cli.runtime_resolvers);
    }

    #[test]
    fn rejects_unknown_units() {
        let err = Cli::try_parse_from([
            "series-reporter",
            "--url",
            "http://localhost:8080/series",
            "--rate-unit",
            "fortnights",
        ])
        .expect_err("should fail");
        assert!(err.to_string().contains("Unknown time unit `fortnights`"));
    }
}
