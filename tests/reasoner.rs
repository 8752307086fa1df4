//! Chat-completions reasoner against a mock OpenAI-compatible server.

mod common;

use a2a_dispatch::client::TaskClient;
use a2a_dispatch::error::ErrorKind;
use a2a_dispatch::reasoner::{ChatCompletionsReasoner, Reasoner, ReasonerConfig};
use a2a_dispatch::routing::{AgentKind, RoutingDecision};
use a2a_dispatch::Dispatcher;
use common::{refused_url, start_mock_agent, start_mock_llm, MockAgent};

fn config(api_base: &str) -> ReasonerConfig {
    let mut config = ReasonerConfig::new("gsk_test");
    config.api_base = api_base.to_string();
    config.model = "test-model".to_string();
    config
}

#[tokio::test]
async fn reply_returns_first_choice() {
    let (api_base, recorded, _handle) = start_mock_llm(Some("sql")).await;
    let reasoner = ChatCompletionsReasoner::new(config(&api_base));

    let reply = reasoner.reply("show me sales").await.unwrap();
    assert_eq!(reply.as_deref(), Some("sql"));

    let requests = recorded.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["authorization"], "Bearer gsk_test");
    let body = &requests[0]["body"];
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "show me sales");
}

#[tokio::test]
async fn empty_choices_are_none() {
    let (api_base, _recorded, _handle) = start_mock_llm(None).await;
    let reasoner = ChatCompletionsReasoner::new(config(&api_base));

    assert_eq!(reasoner.reply("hi").await.unwrap(), None);
}

#[tokio::test]
async fn unreachable_api_is_transport_failure() {
    let reasoner = ChatCompletionsReasoner::new(config(&format!("{}/v1", refused_url().await)));

    let err = reasoner.reply("hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
}

#[tokio::test]
async fn dispatcher_classifies_through_chat_completions() {
    let (api_base, _llm, _llm_handle) = start_mock_llm(Some("RAG")).await;
    let (agent_url, recorded, _agent_handle) =
        start_mock_agent(MockAgent::single_shot("Pinecone stores vectors.")).await;

    let dispatcher = Dispatcher::builder()
        .with_agent(AgentKind::Rag, TaskClient::new(&agent_url))
        .with_reasoner(ChatCompletionsReasoner::new(config(&api_base)))
        .build()
        .unwrap();

    let answer = dispatcher.answer("what does pinecone store?").await;
    assert_eq!(answer.decision, RoutingDecision::Agent(AgentKind::Rag));
    assert_eq!(answer.result.content, "Pinecone stores vectors.");
    assert_eq!(recorded.methods(), vec!["tasks/sendSubscribe", "tasks/send"]);
}
