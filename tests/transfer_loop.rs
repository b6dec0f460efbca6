//! End-to-end loop behaviour against the in-memory chain.

mod common;

use std::collections::HashSet;

use alloy::primitives::Address;
use common::{credential, request, settings, MockChainClient, Submit, RECIPIENT};
use transfer_loop::blockchain::{ChainError, Credential, TxStatus};
use transfer_loop::config::FailurePolicy;
use transfer_loop::transfer::{IterationResult, LoopError, RunOutcome, TransferLoop};

#[tokio::test(start_paused = true)]
async fn test_runs_n_sequential_transfers() {
    let chain = MockChainClient::new();
    let report = TransferLoop::new(chain.clone(), settings(5))
        .run(credential())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.records.len(), 5);
    assert_eq!(report.confirmed_count(), 5);
    assert_eq!(chain.submit_calls(), 5);
    assert_eq!(chain.confirm_calls(), 5);
    assert_eq!(chain.overlapping_submits(), 0);

    let hashes: HashSet<_> = report.confirmed().map(|r| r.hash).collect();
    assert_eq!(hashes.len(), 5);

    for (i, record) in report.records.iter().enumerate() {
        assert_eq!(record.iteration, i as u64 + 1);
        assert_eq!(record.submissions, 1);
        let tx = record.transaction.as_ref().unwrap();
        assert_eq!(tx.status(), TxStatus::Confirmed);
        assert_eq!(tx.hash(), chain.hashes()[i]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_zero_iterations_submits_nothing() {
    let chain = MockChainClient::new();
    let report = TransferLoop::new(chain.clone(), settings(0))
        .run(credential())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(report.records.is_empty());
    assert_eq!(chain.submit_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_every_request_is_identical() {
    let chain = MockChainClient::new();
    TransferLoop::new(chain.clone(), settings(4))
        .run(credential())
        .await
        .unwrap();

    let requests = chain.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|r| *r == request()));
    assert_eq!(requests[0].recipient(), RECIPIENT.parse::<Address>().unwrap());
    assert_eq!(requests[0].amount(), "0.0001");
}

#[tokio::test(start_paused = true)]
async fn test_abort_policy_stops_at_first_failure() {
    let chain = MockChainClient::new().with_submits([
        Submit::Accept,
        Submit::Accept,
        Submit::Transport,
    ]);
    let mut settings = settings(10);
    settings.policy = FailurePolicy::Abort;

    let report = TransferLoop::new(chain.clone(), settings)
        .run(credential())
        .await
        .unwrap();

    assert!(matches!(report.outcome, RunOutcome::Aborted { iteration: 3, .. }));
    assert_eq!(report.confirmed_count(), 2);
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.records[2].result, IterationResult::Aborted);
    assert_eq!(chain.submit_calls(), 3);
    assert!(!report.is_success());
}

#[tokio::test(start_paused = true)]
async fn test_malformed_key_submits_nothing() {
    let chain = MockChainClient::new();
    let result = TransferLoop::new(chain.clone(), settings(3))
        .run(Credential::new("not-a-key"))
        .await;

    assert!(matches!(
        result,
        Err(LoopError::Startup(ChainError::InvalidCredential(_)))
    ));
    assert_eq!(chain.submit_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_endpoint_submits_nothing() {
    let chain = MockChainClient::new().unreachable();
    let result = TransferLoop::new(chain.clone(), settings(3))
        .run(credential())
        .await;

    assert!(matches!(
        result,
        Err(LoopError::Startup(ChainError::EndpointUnreachable { .. }))
    ));
    assert_eq!(chain.submit_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_report_serializes() {
    let chain = MockChainClient::new();
    let report = TransferLoop::new(chain, settings(2))
        .run(credential())
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["iterations_requested"], 2);
    assert_eq!(json["outcome"]["status"], "completed");
    assert_eq!(json["records"][1]["result"], "confirmed");
}
