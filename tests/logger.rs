use serde_json::{json, Value};
use service_logger::{
    Callable, ErrorValue, LogValue, Logger, LoggerConfig, MemorySink, Record, Severity, Stream,
    LOG_LEVEL_ENV,
};

fn logger_at(level: Severity) -> (Logger, MemorySink) {
    let sink = MemorySink::new();
    let logger = Logger::with_sink("Svc", LoggerConfig::with_level(level), sink.clone());
    (logger, sink)
}

fn parse(line: &str) -> Value {
    serde_json::from_str(line).expect("each line is one JSON object")
}

fn emit_all(logger: &Logger) {
    logger.error("e").unwrap();
    logger.warn("w").unwrap();
    logger.info("i").unwrap();
    logger.debug("d").unwrap();
}

fn emitted_levels(sink: &MemorySink) -> Vec<String> {
    sink.lines()
        .iter()
        .map(|c| parse(&c.line)["level"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn each_level_emits_iff_threshold_allows_it() {
    for threshold in Severity::ALL {
        let (logger, sink) = logger_at(threshold);
        emit_all(&logger);
        let expected: Vec<String> = Severity::ALL
            .iter()
            .filter(|level| threshold >= **level)
            .map(|level| level.as_str().to_string())
            .collect();
        assert_eq!(emitted_levels(&sink), expected, "threshold {threshold}");
    }
}

#[test]
fn default_threshold_is_info() {
    let config = LoggerConfig::from_lookup(|_| Some("chatty".to_string()));
    let sink = MemorySink::new();
    let logger = Logger::with_sink("Svc", config, sink.clone());
    assert_eq!(logger.threshold(), Severity::Info);
    emit_all(&logger);
    assert_eq!(emitted_levels(&sink), vec!["ERROR", "WARN", "INFO"]);
}

#[test]
fn debug_enables_everything_and_error_only_errors() {
    let (logger, sink) = logger_at(Severity::Debug);
    emit_all(&logger);
    assert_eq!(sink.lines().len(), 4);

    let (logger, sink) = logger_at(Severity::Error);
    emit_all(&logger);
    assert_eq!(emitted_levels(&sink), vec!["ERROR"]);
}

#[test]
fn disabled_level_is_a_complete_no_op() {
    let (logger, sink) = logger_at(Severity::Info);
    logger.debug("x").unwrap();
    assert!(sink.is_empty());

    logger.info("y").unwrap();
    let out = sink.lines_on(Stream::Stdout);
    assert_eq!(out.len(), 1);
    assert!(sink.lines_on(Stream::Stderr).is_empty());
    let rec = parse(&out[0]);
    assert_eq!(rec["level"], "INFO");
    assert_eq!(rec["message"], "y");
    assert_eq!(rec["microservice"], "Svc");
}

#[test]
fn structured_error_goes_to_stderr_flattened() {
    let (logger, sink) = logger_at(Severity::Info);
    logger.error(json!({"code": 42})).unwrap();
    let err = sink.lines_on(Stream::Stderr);
    assert_eq!(err.len(), 1);
    assert!(sink.lines_on(Stream::Stdout).is_empty());
    let rec = parse(&err[0]);
    assert_eq!(rec["level"], "ERROR");
    assert_eq!(rec["message"], "{\"code\":42}");
    assert_eq!(rec["code"], 42);
}

#[test]
fn text_messages_are_kept_verbatim() {
    let (logger, sink) = logger_at(Severity::Info);
    let long = "x".repeat(10_000);
    let tricky = "say \"hi\"\nthen leave";
    logger.info("").unwrap();
    logger.info(&long).unwrap();
    logger.info(tricky).unwrap();

    let lines = sink.lines_on(Stream::Stdout);
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| !l.contains('\n')));
    assert_eq!(parse(&lines[0])["message"], "");
    assert_eq!(parse(&lines[1])["message"].as_str().unwrap().len(), 10_000);
    assert_eq!(parse(&lines[2])["message"], tricky);
}

#[test]
fn structured_input_is_sanitized_and_flattened() {
    let (logger, sink) = logger_at(Severity::Info);
    let order = Record::new();
    order
        .insert("id", 7)
        .insert("onDone", Callable::new("() => done()"))
        .insert_hidden("password", "hunter2")
        .insert_symbol("trace", "internal")
        .insert("self", order.clone());
    logger.info(order).unwrap();

    let line = &sink.lines_on(Stream::Stdout)[0];
    assert!(!line.contains("hunter2"));
    assert!(!line.contains("internal"));
    let rec = parse(line);
    assert_eq!(rec["id"], 7);
    assert_eq!(rec["onDone"], "() => done()");
    assert_eq!(rec["self"], "[Circular]");
    assert!(rec.get("password").is_none());
    let message: Value = serde_json::from_str(rec["message"].as_str().unwrap()).unwrap();
    assert_eq!(
        message,
        json!({"id": 7, "onDone": "() => done()", "self": "[Circular]"})
    );
    for key in ["timestamp", "level", "microservice", "caller"] {
        assert!(rec.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn logged_errors_become_name_message_stack() {
    let (logger, sink) = logger_at(Severity::Info);
    let wrapper = Record::new();
    wrapper.insert("err", ErrorValue::new("TypeError", "not a number"));
    logger.warn(wrapper).unwrap();
    let rec = parse(&sink.lines()[0].line);
    assert_eq!(rec["err"]["name"], "TypeError");
    assert_eq!(rec["err"]["message"], "not a number");
    assert!(rec["err"]["stack"].as_str().unwrap().contains("at "));
}

#[test]
fn complex_error_is_single_line_with_stack() {
    let (logger, sink) = logger_at(Severity::Info);
    let err = ErrorValue::new("ValidationError", "quantity must be positive");
    logger.log_complex_error(err).unwrap();

    let lines = sink.lines_on(Stream::Stderr);
    assert_eq!(lines.len(), 1);
    let rec = parse(&lines[0]);
    assert_eq!(rec["level"], "ERROR");
    assert_eq!(rec["microservice"], "Svc");
    let text = rec["complexError"].as_str().unwrap();
    assert!(!text.contains('\n'));
    assert!(text.starts_with("ValidationError: quantity must be positive "));
    assert!(text.contains(" at "));
}

#[test]
fn complex_error_accepts_error_wrapped_in_log_value() {
    let (logger, sink) = logger_at(Severity::Error);
    let parse_err = "abc".parse::<u32>().unwrap_err();
    logger
        .log_complex_error(LogValue::from(ErrorValue::from_error(&parse_err)))
        .unwrap();
    let rec = parse(&sink.lines_on(Stream::Stderr)[0]);
    let text = rec["complexError"].as_str().unwrap();
    assert!(text.starts_with("ParseIntError: invalid digit found in string"));
}

#[test]
fn complex_error_of_structured_value_is_its_json() {
    let (logger, sink) = logger_at(Severity::Error);
    logger.log_complex_error(json!({"reason": "timeout"})).unwrap();
    let rec = parse(&sink.lines_on(Stream::Stderr)[0]);
    assert_eq!(rec["complexError"], "{\"reason\":\"timeout\"}");
}

// Optimized builds may inline the caller away; the name is only checked in debug.
#[cfg(debug_assertions)]
#[test]
fn caller_is_the_function_that_logged() {
    let (logger, sink) = logger_at(Severity::Debug);
    logger.info("from test").unwrap();
    place_order(&logger);
    logger.log_complex_error(json!({"x": 1})).unwrap();

    let callers: Vec<String> = sink
        .lines()
        .iter()
        .map(|c| parse(&c.line)["caller"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        callers,
        vec![
            "caller_is_the_function_that_logged",
            "place_order",
            "caller_is_the_function_that_logged",
        ]
    );
}

#[cfg(debug_assertions)]
#[inline(never)]
fn place_order(logger: &Logger) {
    logger.debug("placing order").unwrap();
}

#[test]
fn threshold_is_fixed_at_construction() {
    let logger = Logger::with_config("Svc", LoggerConfig::with_level(Severity::Warn));
    assert_eq!(logger.threshold(), Severity::Warn);
    assert_eq!(logger.service_name(), "Svc");
    assert!(!logger.is_enabled(Severity::Info));
}

// The only test in this binary that touches LOG_LEVEL; keep it that way.
#[test]
fn new_reads_log_level_once() {
    std::env::set_var(LOG_LEVEL_ENV, "Debug");
    let logger = Logger::new("Svc");
    assert_eq!(logger.threshold(), Severity::Debug);

    std::env::set_var(LOG_LEVEL_ENV, "error");
    assert_eq!(logger.threshold(), Severity::Debug);
    assert!(logger.is_enabled(Severity::Debug));
    assert_eq!(LoggerConfig::from_env().level, Severity::Error);
    assert_eq!(Logger::new("Other").threshold(), Severity::Error);

    std::env::remove_var(LOG_LEVEL_ENV);
    assert_eq!(Logger::new("Svc").threshold(), Severity::Info);
}
