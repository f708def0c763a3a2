//! Verikit - readiness probe and backend smoke suites
//!
//! Wires the real adapters into the resilient session, checks that every
//! service of the environment answers, then runs the smoke suites against
//! the API endpoints.

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use verikit_application::ports::{Clock, HttpClient};
use verikit_application::{
    ApplicationError, ApplicationResult, ReadinessProber, ResilientSession,
};
use verikit_domain::{
    Assertion, DomainError, HarnessConfig, RecordSchema, RequestSpec, StatusExpectation,
    TestResults, TestSuite,
};
use verikit_infrastructure::{ReqwestHttpClient, TestRunner, TokioClock};

/// Model every deployment is expected to serve.
pub const EXPECTED_MODEL: &str = "llama3.2:3b-instruct-fp16";

/// Environment variable holding the JSON body of the chat smoke check.
pub const ENV_CHAT_BODY: &str = "VERIKIT_CHAT_BODY";
/// Environment variable holding the text the chat answer must contain.
pub const ENV_CHAT_EXPECT: &str = "VERIKIT_CHAT_EXPECT";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Installs the global tracing subscriber.
///
/// Honours `RUST_LOG` and falls back to `info`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Optional streamed chat check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCheck {
    /// JSON request body posted to the chat endpoint.
    pub body: String,
    /// Text the aggregated answer must contain.
    pub expect: String,
}

impl ChatCheck {
    /// Reads the check from a variable lookup.
    ///
    /// Returns `None` unless both variables are set and non-empty.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let body = lookup(ENV_CHAT_BODY).filter(|v| !v.trim().is_empty())?;
        let expect = lookup(ENV_CHAT_EXPECT).filter(|v| !v.is_empty())?;
        Some(Self { body, expect })
    }

    /// Reads the check from the process environment.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// A request paired with the suite its response must satisfy.
#[derive(Debug, Clone)]
pub struct SmokeCheck {
    /// Request to issue.
    pub request: RequestSpec,
    /// Assertions applied to the response.
    pub suite: TestSuite,
}

fn endpoint_url(config: &HarnessConfig, name: &str) -> ApplicationResult<String> {
    config.endpoint(name).ok_or_else(|| {
        DomainError::InvalidConfig {
            key: name.to_string(),
            message: "unknown endpoint".to_string(),
        }
        .into()
    })
}

fn json_list_suite(name: &str, schema: RecordSchema) -> TestSuite {
    TestSuite::new(name)
        .with_assertion(Assertion::StatusCode {
            expected: StatusExpectation::exact(200),
        })
        .with_assertion(Assertion::ContentType {
            expected: JSON_CONTENT_TYPE.to_string(),
        })
        .with_assertion(Assertion::JsonList { schema })
}

/// Builds the smoke checks for `config`, in execution order.
///
/// # Errors
///
/// Returns an error if the endpoint catalogue lacks one of the endpoints.
pub fn smoke_checks(
    config: &HarnessConfig,
    chat: Option<&ChatCheck>,
) -> ApplicationResult<Vec<SmokeCheck>> {
    let mut checks = vec![
        SmokeCheck {
            request: RequestSpec::get(endpoint_url(config, "llms")?),
            suite: json_list_suite("llms", RecordSchema::models()).with_assertion(
                Assertion::JsonListContains {
                    field: "model_name".to_string(),
                    value: EXPECTED_MODEL.into(),
                },
            ),
        },
        SmokeCheck {
            request: RequestSpec::get(endpoint_url(config, "virtual_assistants")?),
            suite: json_list_suite("virtual_assistants", RecordSchema::virtual_assistants()),
        },
        SmokeCheck {
            request: RequestSpec::get(endpoint_url(config, "tools")?),
            suite: json_list_suite("tools", RecordSchema::tools()),
        },
    ];

    if let Some(chat) = chat {
        checks.push(SmokeCheck {
            request: RequestSpec::post_json(endpoint_url(config, "chat")?, chat.body.clone()),
            suite: TestSuite::new("chat")
                .with_assertion(Assertion::StatusCode {
                    expected: StatusExpectation::exact(200),
                })
                .with_assertion(Assertion::SseContains {
                    text: chat.expect.clone(),
                }),
        });
    }

    Ok(checks)
}

/// Issues one check's request and runs its suite on the response.
///
/// Every failed assertion is logged; the first one is returned as the error.
///
/// # Errors
///
/// Returns [`ApplicationError::RequestFailed`] if no response was received,
/// or [`ApplicationError::Validation`] if an assertion of the suite failed.
pub async fn run_check<H: HttpClient, C: Clock>(
    session: &ResilientSession<H, C>,
    runner: &TestRunner,
    check: &SmokeCheck,
) -> ApplicationResult<TestResults> {
    let response = session.execute(&check.request).await.into_result()?;
    let results = runner.run(&check.suite, &response);

    for failure in results.failures() {
        warn!(suite = %results.suite_name, "{}", failure.message());
    }
    if let Some(failure) = results.failures().next() {
        warn!(
            suite = %results.suite_name,
            passed = results.passed,
            failed = results.failed,
            "suite failed"
        );
        failure.clone().into_result()?;
    }

    Ok(results)
}

/// Runs every check and logs the outcome of each suite.
///
/// Returns `true` when every suite passed.
pub async fn run_checks<H: HttpClient, C: Clock>(
    session: &ResilientSession<H, C>,
    checks: &[SmokeCheck],
) -> bool {
    let runner = TestRunner::new();
    let mut all_passed = true;

    for check in checks {
        match run_check(session, &runner, check).await {
            Ok(results) => {
                info!(
                    suite = %results.suite_name,
                    passed = results.passed,
                    duration_ms = results.duration_ms,
                    "suite passed"
                );
            }
            Err(ApplicationError::Validation(failure)) => {
                all_passed = false;
                warn!(suite = %check.suite.name, "{failure}");
            }
            Err(err) => {
                all_passed = false;
                error!(suite = %check.suite.name, "{err}");
            }
        }
    }

    all_passed
}

/// Probes the environment, then runs the smoke checks through `session`.
///
/// Returns `Ok(true)` when every suite passed.
///
/// # Errors
///
/// Returns [`ApplicationError::EnvironmentUnavailable`] if a service does
/// not answer.
pub async fn run_with<H: HttpClient, C: Clock>(
    session: &ResilientSession<H, C>,
    config: &HarnessConfig,
    chat: Option<&ChatCheck>,
) -> ApplicationResult<bool> {
    let report = ReadinessProber::new(session).probe(&config.services()).await?;
    info!(services = report.services.len(), "environment ready");

    let checks = smoke_checks(config, chat)?;
    Ok(run_checks(session, &checks).await)
}

/// Runs the harness against `config` with the reqwest and tokio adapters.
///
/// # Errors
///
/// See [`run_with`].
pub async fn run(config: &HarnessConfig, chat: Option<&ChatCheck>) -> ApplicationResult<bool> {
    let session = ResilientSession::from_config(ReqwestHttpClient::new()?, TokioClock, config);
    run_with(&session, config, chat).await
}
