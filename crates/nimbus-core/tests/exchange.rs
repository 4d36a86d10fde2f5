use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nimbus_core::{
    BackendError, ChatRole, ExchangeController, ExchangeState, QueryResponse, WeatherBackend,
    WeatherCategory, WeatherInsights, UNREACHABLE_NOTICE,
};
use tokio::sync::Notify;

/// Replies from a queue and records every query it receives
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<QueryResponse, BackendError>>>,
    queries: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    fn new(replies: Vec<Result<QueryResponse, BackendError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    fn gated(replies: Vec<Result<QueryResponse, BackendError>>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(replies)
        }
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherBackend for ScriptedBackend {
    async fn query(&self, query: &str) -> Result<QueryResponse, BackendError> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Aborted("script exhausted".to_string())))
    }
}

fn connection_refused() -> Result<QueryResponse, BackendError> {
    Err(BackendError::Aborted("connection refused".to_string()))
}

fn controller_for(backend: &Arc<ScriptedBackend>) -> ExchangeController {
    ExchangeController::new(backend.clone())
}

#[tokio::test]
async fn each_exchange_appends_user_then_assistant() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(QueryResponse::answered("Sunny in Rome").with_weather_type("clear")),
        Ok(QueryResponse::failed("City not found")),
        connection_refused(),
    ]));
    let mut controller = controller_for(&backend);

    let inputs = ["weather in Rome", "weather in Xyzzy", "weather in Paris"];
    for (i, input) in inputs.iter().enumerate() {
        assert!(controller.submit(input).await.is_some());
        let log = controller.session().conversation();
        assert_eq!(log.len(), 2 * (i + 1));
        assert_eq!(log.messages()[2 * i].role, ChatRole::User);
        assert_eq!(log.messages()[2 * i].text, *input);
        assert_eq!(log.messages()[2 * i + 1].role, ChatRole::Assistant);
    }
    assert_eq!(backend.queries().len(), 3);
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let backend = Arc::new(ScriptedBackend::default());
    let mut controller = controller_for(&backend);

    assert!(controller.submit("").await.is_none());
    assert!(controller.submit("    ").await.is_none());
    assert!(!controller.dispatch("\t\n"));

    assert!(controller.session().conversation().is_empty());
    assert_eq!(controller.session().state(), ExchangeState::Idle);
    assert!(backend.queries().is_empty());
}

#[tokio::test]
async fn submissions_while_in_flight_are_ignored() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(ScriptedBackend::gated(
        vec![Ok(QueryResponse::answered("Drizzle in Seattle").with_weather_type("rain"))],
        gate.clone(),
    ));
    let mut controller = controller_for(&backend);

    assert!(controller.dispatch("weather in Seattle"));
    assert!(controller.is_in_flight());
    assert!(!controller.dispatch("weather in Seattle"));
    assert!(!controller.dispatch("weather in Seattle"));
    assert!(controller.submit("weather in Boston").await.is_none());

    assert_eq!(controller.session().conversation().len(), 1);

    gate.notify_one();
    let reply = controller.wait_settled().await.unwrap();
    assert_eq!(reply.text, "Drizzle in Seattle");

    assert_eq!(controller.session().conversation().len(), 2);
    assert_eq!(backend.queries(), vec!["weather in Seattle".to_string()]);
    assert_eq!(controller.session().state(), ExchangeState::Idle);
}

#[tokio::test]
async fn successful_reply_sets_text_and_category() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(
        QueryResponse::answered("Sunny, 25°C").with_weather_type("clear"),
    )]));
    let mut controller = controller_for(&backend);

    let reply = controller.submit("weather in Madrid").await.unwrap();
    assert_eq!(reply.text, "Sunny, 25°C");
    assert!(reply.insights.is_none());
    assert!(!reply.is_user());
    assert_eq!(controller.session().category(), WeatherCategory::Clear);
}

#[tokio::test]
async fn successful_reply_carries_insights() {
    let insights = WeatherInsights {
        temperature: "Moderate".to_string(),
        rain: "Rain expected".to_string(),
        advice: "Carry an umbrella".to_string(),
        clothing: "Light cotton clothing recommended".to_string(),
        caution: "No major caution".to_string(),
    };
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(QueryResponse::answered(
        "Showers in Kochi",
    )
    .with_weather_type("rain")
    .with_insights(insights.clone()))]));
    let mut controller = controller_for(&backend);

    let reply = controller.submit("weather in Kochi").await.unwrap();
    assert_eq!(reply.insights.as_ref(), Some(&insights));
    assert_eq!(controller.session().category(), WeatherCategory::Rain);
}

#[tokio::test]
async fn semantic_failure_shows_error_and_keeps_category() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(QueryResponse::answered("Snow in Oslo").with_weather_type("snow")),
        Ok(QueryResponse::failed("City not found")),
    ]));
    let mut controller = controller_for(&backend);

    controller.submit("weather in Oslo").await.unwrap();
    let reply = controller.submit("weather in Nowhere").await.unwrap();

    assert_eq!(reply.text, "City not found");
    assert!(reply.insights.is_none());
    assert_eq!(controller.session().category(), WeatherCategory::Snow);
    assert_eq!(controller.session().state(), ExchangeState::Idle);
}

#[tokio::test]
async fn transport_failure_shows_notice_and_resets_category() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(QueryResponse::answered("Overcast in Dublin").with_weather_type("cloudy")),
        connection_refused(),
    ]));
    let mut controller = controller_for(&backend);

    controller.submit("weather in Dublin").await.unwrap();
    assert_eq!(controller.session().category(), WeatherCategory::Cloudy);

    let reply = controller.submit("and now?").await.unwrap();
    assert_eq!(reply.text, UNREACHABLE_NOTICE);
    assert!(reply.insights.is_none());
    assert_eq!(controller.session().category(), WeatherCategory::Default);
    assert_eq!(controller.session().state(), ExchangeState::Idle);
}

#[tokio::test]
async fn missing_or_unknown_weather_type_defaults_category() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(QueryResponse::answered("Hazy in Delhi").with_weather_type("smoke")),
        Ok(QueryResponse::answered("Pleasant in Lisbon")),
        Ok(QueryResponse::answered("Hazy in Delhi").with_weather_type("smoke")),
        Ok(QueryResponse::answered("Whirlwinds").with_weather_type("tornado")),
    ]));
    let mut controller = controller_for(&backend);

    controller.submit("Delhi").await.unwrap();
    controller.submit("Lisbon").await.unwrap();
    assert_eq!(controller.session().category(), WeatherCategory::Default);

    controller.submit("Delhi").await.unwrap();
    assert_eq!(controller.session().category(), WeatherCategory::Smoke);
    controller.submit("Kansas").await.unwrap();
    assert_eq!(controller.session().category(), WeatherCategory::Default);
}

#[tokio::test]
async fn message_ids_are_unique_across_back_to_back_exchanges() {
    let replies = (0..25)
        .map(|i| match i % 3 {
            0 => Ok(QueryResponse::answered(format!("answer {i}"))),
            1 => Ok(QueryResponse::failed(format!("error {i}"))),
            _ => connection_refused(),
        })
        .collect();
    let backend = Arc::new(ScriptedBackend::new(replies));
    let mut controller = controller_for(&backend);

    for i in 0..25 {
        controller.submit(&format!("query {i}")).await.unwrap();
    }

    let ids: HashSet<_> = controller
        .session()
        .conversation()
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids.len(), 50);
}

#[tokio::test]
async fn state_is_idle_before_and_after_every_path() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(QueryResponse::answered("ok")),
        Ok(QueryResponse::failed("nope")),
        connection_refused(),
    ]));
    let mut controller = controller_for(&backend);
    assert_eq!(controller.session().state(), ExchangeState::Idle);

    for input in ["one", "two", "three"] {
        assert!(controller.dispatch(input));
        assert_eq!(controller.session().state(), ExchangeState::InFlight);
        controller.wait_settled().await.unwrap();
        assert_eq!(controller.session().state(), ExchangeState::Idle);
    }
}

#[tokio::test]
async fn trimmed_query_is_sent_but_raw_text_is_logged() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(QueryResponse::answered("Mild"))]));
    let mut controller = controller_for(&backend);

    controller.submit("   weather in Nice \n").await.unwrap();

    assert_eq!(backend.queries(), vec!["weather in Nice".to_string()]);
    assert_eq!(
        controller.session().conversation().messages()[0].text,
        "   weather in Nice \n"
    );
}

#[tokio::test]
async fn wait_settled_without_dispatch_is_none() {
    let backend = Arc::new(ScriptedBackend::default());
    let mut controller = controller_for(&backend);
    assert!(controller.wait_settled().await.is_none());
}

#[tokio::test]
async fn cancelled_wait_leaves_exchange_in_flight() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(ScriptedBackend::gated(
        vec![Ok(QueryResponse::answered("Clear skies").with_weather_type("clear"))],
        gate.clone(),
    ));
    let mut controller = controller_for(&backend);
    assert!(controller.dispatch("weather in Lima"));

    tokio::select! {
        _ = controller.wait_settled() => panic!("request should still be gated"),
        _ = tokio::time::sleep(std::time::Duration::from_millis(20)) => {}
    }
    assert!(controller.is_in_flight());
    assert_eq!(controller.session().conversation().len(), 1);

    gate.notify_one();
    let reply = controller.wait_settled().await.unwrap();
    assert_eq!(reply.text, "Clear skies");
    assert_eq!(controller.session().category(), WeatherCategory::Clear);
}

#[tokio::test]
async fn dropped_submit_can_still_be_settled() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(ScriptedBackend::gated(
        vec![Ok(QueryResponse::answered("Flurries in Oslo").with_weather_type("snow"))],
        gate.clone(),
    ));
    let mut controller = controller_for(&backend);

    tokio::select! {
        _ = controller.submit("weather in Oslo") => panic!("request should still be gated"),
        _ = tokio::time::sleep(std::time::Duration::from_millis(20)) => {}
    }
    assert!(controller.is_in_flight());
    assert_eq!(controller.session().conversation().len(), 1);

    gate.notify_one();
    let reply = controller.wait_settled().await.unwrap();
    assert_eq!(reply.text, "Flurries in Oslo");
    assert_eq!(controller.session().category(), WeatherCategory::Snow);
    assert!(!controller.is_in_flight());

    assert!(controller.submit("and tomorrow?").await.is_some());
}
