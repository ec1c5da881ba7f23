use moneylingo_orchestrator::{
    agents::create_default_registry,
    audit::DecisionLog,
    monetization::{InMemoryUsageStore, MonetizationGate, StaticSubscriptions},
    providers::mock::{MockLedger, MockLlm, MockSpeech},
    voice::VoiceAdapter,
    Capability, Orchestrator, Request, ResponseStatus,
};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_plan_requests_admit_exactly_free_limit() {
    let llm = Arc::new(MockLlm::echo());
    let orchestrator = Arc::new(Orchestrator::new(
        create_default_registry(llm.clone(), Arc::new(MockLedger::working())),
        VoiceAdapter::new(Arc::new(MockSpeech::unconfigured()), std::env::temp_dir()),
        MonetizationGate::new(
            Arc::new(StaticSubscriptions::new()),
            Arc::new(InMemoryUsageStore::new()),
        ),
        DecisionLog::new(),
    ));

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                let request = Request::new("free-user", format!("plan my savings #{}", i))
                    .with_capability(Capability::FinancialPlan);
                orchestrator.handle(&request).await.status
            })
        })
        .collect();

    let mut ok = 0;
    let mut denied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            ResponseStatus::Ok => ok += 1,
            ResponseStatus::Denied => denied += 1,
            ResponseStatus::Failed => panic!("no request should fail"),
        }
    }

    assert_eq!(ok, 5);
    assert_eq!(denied, 15);
    assert_eq!(llm.calls(), 5);

    let decisions = orchestrator
        .decisions()
        .list_for_user("free-user")
        .await
        .unwrap();
    assert_eq!(decisions.len(), 20);
}
