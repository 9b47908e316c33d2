use sciencedirect_agent::agent::ResearchAgent;
use sciencedirect_agent::{answer_research_question, Config, ScienceDirectClient};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(provider_uri: &str, llm_uri: &str) -> Config {
    let mut config = Config::default();
    config.provider.api_key = "test-key".to_string();
    config.provider.base_url = provider_uri.to_string();
    config.agent.api_key = "sk-test".to_string();
    config.agent.base_url = llm_uri.to_string();
    config.agent.max_steps = 4;
    config
}

fn tool_call_reply(name: &str, arguments: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": name, "arguments": arguments}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

fn final_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-2",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_agent_searches_then_answers_with_citations() {
    let provider = MockServer::start().await;
    let llm = MockServer::start().await;

    // First completion asks for a search, second returns the answer
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_reply(
            "search_articles",
            "{\"query\":\"microplastics in drinking water\",\"limit\":2}",
        )))
        .up_to_n_times(1)
        .mount(&llm)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(final_reply(
            "{\"answer\": \"Two studies report contamination [1][2].\", \"summary\": \"Evidence of widespread contamination.\"}",
        )))
        .mount(&llm)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/sciencedirect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "search-results": {
                "entry": [
                    {"dc:title": "Microplastics in municipal water", "dc:creator": "Silva, M.", "pii": "S1"},
                    {"dc:title": "Polymer particle detection methods", "dc:creator": ["Chen, W.", {"$": "Osei, K."}], "pii": "S2"}
                ]
            }
        })))
        .mount(&provider)
        .await;

    let config = config_for(&provider.uri(), &llm.uri());
    let client = Arc::new(ScienceDirectClient::new(&config).unwrap());
    let agent = ResearchAgent::new(&config, client).unwrap();

    let response = agent
        .run("Are microplastics present in drinking water?", 2)
        .await
        .unwrap();

    assert_eq!(response.answer, "Two studies report contamination [1][2].");
    assert_eq!(response.summary, "Evidence of widespread contamination.");
    assert_eq!(response.articles.len(), 2);
    assert_eq!(response.articles[0].title, "Microplastics in municipal water");
    assert_eq!(response.articles[1].authors, vec!["Chen, W.", "Osei, K."]);
}

#[tokio::test]
async fn test_agent_fetches_article_details() {
    let provider = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_reply(
            "get_article_details",
            "{\"pii\":\"S0927024821001111\"}",
        )))
        .up_to_n_times(1)
        .mount(&llm)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(final_reply(
            "{\"answer\": \"The full text confirms the mechanism.\", \"summary\": \"Confirmed.\"}",
        )))
        .mount(&llm)
        .await;

    Mock::given(method("GET"))
        .and(path("/article/pii/S0927024821001111"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full-text-retrieval-response": {
                "coredata": {
                    "dc:title": "Degradation mechanisms",
                    "dc:creator": {"$": "Tanaka, H."},
                    "pii": "S0927024821001111"
                }
            }
        })))
        .mount(&provider)
        .await;

    let config = config_for(&provider.uri(), &llm.uri());
    let client = Arc::new(ScienceDirectClient::new(&config).unwrap());
    let agent = ResearchAgent::new(&config, client).unwrap();

    let response = agent.run("What degrades perovskites?", 1).await.unwrap();

    assert_eq!(response.articles.len(), 1);
    assert_eq!(response.articles[0].title, "Degradation mechanisms");
    assert_eq!(response.articles[0].authors, vec!["Tanaka, H."]);
}

#[tokio::test]
async fn test_agent_plain_text_final_message_is_kept() {
    let provider = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(final_reply(
            "Just a plain answer without the JSON contract.",
        )))
        .mount(&llm)
        .await;

    let config = config_for(&provider.uri(), &llm.uri());
    let client = Arc::new(ScienceDirectClient::new(&config).unwrap());
    let agent = ResearchAgent::new(&config, client).unwrap();

    let response = agent.run("Anything?", 1).await.unwrap();
    assert_eq!(
        response.answer,
        "Just a plain answer without the JSON contract."
    );
    assert!(response.summary.is_empty());
    assert!(response.articles.is_empty());
}

#[tokio::test]
async fn test_tool_failure_propagates_out_of_the_loop() {
    let provider = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_reply(
            "search_articles",
            "{\"query\":\"anything\"}",
        )))
        .mount(&llm)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/sciencedirect"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&provider)
        .await;

    let config = config_for(&provider.uri(), &llm.uri());
    let client = Arc::new(ScienceDirectClient::new(&config).unwrap());
    let agent = ResearchAgent::new(&config, client).unwrap();

    let err = agent.run("Anything?", 1).await.unwrap_err();
    assert!(matches!(
        err,
        sciencedirect_agent::Error::AuthenticationFailed { .. }
    ));
}

#[tokio::test]
async fn test_answer_research_question_degrades_on_failure() {
    // Chat endpoint is down; the top-level flow must still return a valid,
    // apologetic response instead of propagating the error.
    let provider = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&llm)
        .await;

    let config = config_for(&provider.uri(), &llm.uri());
    let response = answer_research_question("Does anything work?", 3, &config).await;

    assert!(response
        .answer
        .starts_with("I encountered an error while researching:"));
    assert!(response.articles.is_empty());
    assert_eq!(
        response.summary,
        "Unable to complete the research due to an error."
    );
}

#[tokio::test]
async fn test_answer_research_question_degrades_without_provider_key() {
    let mut config = Config::default();
    config.agent.api_key = "sk-test".to_string();
    // provider key left empty: client construction fails, answer degrades

    let response = answer_research_question("Does anything work?", 3, &config).await;
    assert!(response
        .answer
        .starts_with("I encountered an error while researching:"));
    assert!(response.articles.is_empty());
}
