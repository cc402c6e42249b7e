//! End-to-end protocol scenario
//!
//! Drives the full commit → swap → withdraw flow through the public API with
//! a real Groth16 setup: deposit under a passphrase-derived commitment,
//! operator-executed swap keyed by the nullifier hash, proof-gated
//! withdrawal to an unlinked recipient, and rejection of every replay.

use ark_bn254::Fr;

use umbra_core::{
    check_withdrawable, derive, generate_withdrawal_proof, poseidon_hash1, ScanConfig,
    WithdrawProofSystem, WithdrawalStatus,
};
use umbra_ledger::{
    Address, Asset, FixedRateAggregator, InMemoryVault, LedgerError, NullifierStatus, Pool,
    PoolParams, SwapAggregator, SwapConfig,
};

const CHAIN_ID: u64 = 31_337;

/// 0.0002 native units in wei
const DENOMINATION: u128 = 200_000_000_000_000;

/// 1 native unit buys 3500 full output tokens (rate scaled by 10^18)
const NATIVE_TO_USDC_RATE: u128 = 3_500 * 1_000_000_000_000_000_000;

fn addr(byte: u8) -> Address {
    Address([byte; 20])
}

fn usdc() -> Asset {
    Asset::Fungible(addr(0xa0))
}

struct Harness {
    system: WithdrawProofSystem,
    pool: Pool<FixedRateAggregator, InMemoryVault>,
    owner: Address,
    operator: Address,
    depositor: Address,
}

fn harness() -> Harness {
    let owner = addr(1);
    let operator = addr(2);
    let depositor = addr(3);

    let system = WithdrawProofSystem::setup().expect("test ceremony");

    let mut aggregator = FixedRateAggregator::new(addr(0xee));
    aggregator.set_rate(Asset::Native, usdc(), NATIVE_TO_USDC_RATE);

    let mut vault = InMemoryVault::new();
    vault.credit_account(depositor, Asset::Native, 10 * DENOMINATION);

    let pool = Pool::new(
        PoolParams {
            chain_id: CHAIN_ID,
            owner,
            operator,
        },
        system.verifier().expect("verifier"),
        aggregator,
        vault,
    );

    Harness {
        system,
        pool,
        owner,
        operator,
        depositor,
    }
}

#[test]
fn full_commit_swap_withdraw_flow() {
    let mut h = harness();
    let recipient = addr(0x77);

    // Owner registers the fixed-denomination configuration
    let config_id = h
        .pool
        .register_swap_config(
            h.owner,
            SwapConfig {
                token_in: Asset::Native,
                fixed_amount: DENOMINATION,
            },
        )
        .unwrap();
    assert_eq!(config_id, 1);

    // Deposit phase: derivation is deterministic and the commitment lands
    // at leaf 0
    let secrets = derive("abc123");
    assert_eq!(derive("abc123"), secrets);

    let leaf_index = h
        .pool
        .deposit(h.depositor, secrets.commitment, config_id)
        .unwrap();
    assert_eq!(leaf_index, 0);

    // Swap phase: operator executes against the aggregator, keyed by the
    // nullifier hash
    let nullifier_hash = poseidon_hash1(&secrets.nullifier);
    assert_eq!(nullifier_hash, secrets.nullifier_hash());

    let payload = h
        .pool
        .aggregator()
        .build_execution(Asset::Native, usdc(), DENOMINATION, 100)
        .unwrap();

    let expected_out = h
        .pool
        .aggregator()
        .quote(Asset::Native, usdc(), DENOMINATION)
        .unwrap();

    let amount_out = h
        .pool
        .record_swap(h.operator, nullifier_hash, config_id, usdc(), &payload)
        .unwrap();
    assert_eq!(amount_out, expected_out);

    let result = h.pool.swap_result(&nullifier_hash).unwrap();
    assert_eq!(result.token_out, usdc());
    assert_eq!(result.amount, expected_out);

    // At-most-once swap
    assert!(matches!(
        h.pool
            .record_swap(h.operator, nullifier_hash, config_id, usdc(), &payload),
        Err(LedgerError::AlreadySwapped)
    ));

    // Withdraw phase: client regenerates everything from the passphrase
    assert_eq!(
        check_withdrawable(&h.pool, &nullifier_hash),
        WithdrawalStatus::Ready
    );

    let proof = generate_withdrawal_proof(
        &h.system,
        &h.pool,
        "abc123",
        recipient.as_field(),
        &ScanConfig::immediate(),
    )
    .unwrap();

    let (token_out, amount) = h.pool.withdraw(nullifier_hash, recipient, &proof).unwrap();
    assert_eq!(token_out, usdc());
    assert_eq!(amount, expected_out);
    assert_eq!(h.pool.vault().account_balance(recipient, usdc()), expected_out);

    // At-most-once withdrawal: the identical call is permanently rejected
    // and no double transfer occurs
    assert!(matches!(
        h.pool.withdraw(nullifier_hash, recipient, &proof),
        Err(LedgerError::AlreadyWithdrawn)
    ));
    assert_eq!(h.pool.vault().account_balance(recipient, usdc()), expected_out);
    assert_eq!(
        h.pool.nullifier_status(&nullifier_hash),
        NullifierStatus::Withdrawn
    );
    assert_eq!(
        check_withdrawable(&h.pool, &nullifier_hash),
        WithdrawalStatus::AlreadyWithdrawn
    );
}

#[test]
fn withdrawal_accepts_stale_root() {
    let mut h = harness();
    let recipient = addr(0x55);

    let config_id = h
        .pool
        .register_swap_config(
            h.owner,
            SwapConfig {
                token_in: Asset::Native,
                fixed_amount: DENOMINATION,
            },
        )
        .unwrap();

    let secrets = derive("early bird");
    h.pool
        .deposit(h.depositor, secrets.commitment, config_id)
        .unwrap();

    let payload = h
        .pool
        .aggregator()
        .build_execution(Asset::Native, usdc(), DENOMINATION, 100)
        .unwrap();
    h.pool
        .record_swap(
            h.operator,
            secrets.nullifier_hash(),
            config_id,
            usdc(),
            &payload,
        )
        .unwrap();

    // Proof generated against the root as of now
    let proof = generate_withdrawal_proof(
        &h.system,
        &h.pool,
        "early bird",
        recipient.as_field(),
        &ScanConfig::immediate(),
    )
    .unwrap();
    let proof_root = proof.signals.merkle_root;

    // Other depositors move the root before the withdrawal lands
    for neighbor in ["late-1", "late-2", "late-3"] {
        h.pool
            .deposit(h.depositor, derive(neighbor).commitment, config_id)
            .unwrap();
    }
    assert_ne!(umbra_core::LedgerView::current_root(&h.pool), proof_root);

    // The stale-root proof still withdraws: the root is a proof-only signal
    let (_, amount) = h
        .pool
        .withdraw(secrets.nullifier_hash(), recipient, &proof)
        .unwrap();
    assert_eq!(h.pool.vault().account_balance(recipient, usdc()), amount);
}

#[test]
fn forged_proof_is_rejected() {
    let mut h = harness();
    let recipient = addr(0x66);

    let config_id = h
        .pool
        .register_swap_config(
            h.owner,
            SwapConfig {
                token_in: Asset::Native,
                fixed_amount: DENOMINATION,
            },
        )
        .unwrap();

    let secrets = derive("honest deposit");
    h.pool
        .deposit(h.depositor, secrets.commitment, config_id)
        .unwrap();

    let payload = h
        .pool
        .aggregator()
        .build_execution(Asset::Native, usdc(), DENOMINATION, 100)
        .unwrap();
    h.pool
        .record_swap(
            h.operator,
            secrets.nullifier_hash(),
            config_id,
            usdc(),
            &payload,
        )
        .unwrap();

    let mut proof = generate_withdrawal_proof(
        &h.system,
        &h.pool,
        "honest deposit",
        recipient.as_field(),
        &ScanConfig::immediate(),
    )
    .unwrap();

    // Tamper with the embedded signals so proof and signals disagree
    proof.signals.merkle_root = Fr::from(0xbad_c0deu64);

    assert!(matches!(
        h.pool
            .withdraw(secrets.nullifier_hash(), recipient, &proof),
        Err(LedgerError::InvalidProof)
    ));

    // The failed attempt consumed nothing
    assert_eq!(
        h.pool.nullifier_status(&secrets.nullifier_hash()),
        NullifierStatus::Swapped
    );
}
