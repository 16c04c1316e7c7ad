use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use ledgervm_common::constants::EMPTY_KECCAK_HASH;
use ledgervm_common::types::{Account, AccountInfo};
use ledgervm_common::utils::keccak;
use ledgervm_storage::{Keeper, Params, StorageError};
use std::collections::BTreeMap;

fn contract_account(code: &'static [u8], balance: u64) -> Account {
    Account::new(U256::from(balance), Bytes::from_static(code), 1, BTreeMap::new())
}

#[test]
fn unknown_address_resolves_to_empty_account() {
    let keeper = Keeper::in_memory();
    let address = Address::repeat_byte(0x01);

    assert_eq!(keeper.get_account(address).expect("get"), None);
    let empty = keeper.get_account_or_empty(address).expect("get or empty");
    assert_eq!(empty, AccountInfo::default());
    assert_eq!(empty.code_hash, EMPTY_KECCAK_HASH);
}

#[test]
fn set_account_reconciles_balance_through_mint_and_burn() {
    let keeper = Keeper::in_memory();
    let address = Address::repeat_byte(0x02);

    let mut info = AccountInfo {
        nonce: 3,
        balance: U256::from(1_000u64),
        ..Default::default()
    };
    keeper.set_account(address, info).expect("set");
    assert_eq!(keeper.get_balance(address).expect("balance"), U256::from(1_000u64));
    assert_eq!(keeper.get_nonce(address).expect("nonce"), 3);

    // Lowering the balance burns the delta.
    info.balance = U256::from(250u64);
    keeper.set_account(address, info).expect("set");
    assert_eq!(keeper.get_balance(address).expect("balance"), U256::from(250u64));

    // Equal balance is a no-op.
    keeper.set_account(address, info).expect("set");
    assert_eq!(keeper.get_balance(address).expect("balance"), U256::from(250u64));
}

#[test]
fn set_balance_alone_materializes_the_account() {
    let keeper = Keeper::in_memory();
    let address = Address::repeat_byte(0x0e);

    keeper.set_balance(address, U256::from(1_000u64)).expect("fund");

    let info = keeper.get_account(address).expect("get").expect("exists");
    assert_eq!(info.balance, U256::from(1_000u64));
    assert_eq!(info.nonce, 0);

    // A zero-delta reconciliation on an untouched address stays a no-op.
    let untouched = Address::repeat_byte(0x0f);
    keeper.set_balance(untouched, U256::zero()).expect("no-op");
    assert_eq!(keeper.get_account(untouched).expect("get"), None);
}

#[test]
fn six_decimal_host_truncates_sub_scale_balances() {
    let keeper = Keeper::in_memory();
    keeper
        .set_params(Params {
            denom_decimals: 6,
            ..Default::default()
        })
        .expect("params");
    let address = Address::repeat_byte(0x03);

    // One atto-unit is below the 10^12 scale factor and truncates away.
    keeper.set_balance(address, U256::one()).expect("set balance");
    assert_eq!(keeper.get_balance(address).expect("balance"), U256::zero());

    // Exact multiples of the factor survive the round trip.
    let exact = U256::from(5_000_000_000_000u64);
    keeper.set_balance(address, exact).expect("set balance");
    assert_eq!(keeper.get_balance(address).expect("balance"), exact);
}

#[test]
fn zero_storage_write_deletes_the_backing_entry() {
    let keeper = Keeper::in_memory();
    let address = Address::repeat_byte(0x04);
    let key = H256::repeat_byte(0x10);

    keeper
        .set_state(address, key, H256::repeat_byte(0xff))
        .expect("set");
    assert!(keeper.state_entry_exists(address, key).expect("exists"));

    keeper.set_state(address, key, H256::zero()).expect("zero write");
    assert_eq!(keeper.get_state(address, key).expect("get"), H256::zero());
    assert!(!keeper.state_entry_exists(address, key).expect("exists"));
}

#[test]
fn delete_account_requires_a_contract() {
    let keeper = Keeper::in_memory();

    // Never-seen address: no-op success, balance stays zero.
    let unseen = Address::repeat_byte(0x05);
    keeper.delete_account(unseen).expect("no-op delete");
    assert_eq!(keeper.get_balance(unseen).expect("balance"), U256::zero());

    // Externally owned account: descriptive error.
    let eoa = Address::repeat_byte(0x06);
    keeper
        .set_account(
            eoa,
            AccountInfo {
                nonce: 1,
                balance: U256::from(10u64),
                ..Default::default()
            },
        )
        .expect("set");
    let err = keeper.delete_account(eoa).expect_err("not a contract");
    assert!(matches!(err, StorageError::NotContract(a) if a == eoa));
    assert!(
        err.to_string()
            .contains("only smart contracts can be self-destructed")
    );
}

#[test]
fn delete_account_clears_balance_storage_and_code_link() {
    let keeper = Keeper::in_memory();
    let address = Address::repeat_byte(0x07);
    let account = contract_account(&[0x60, 0x00], 500);
    keeper.seed_account(address, &account).expect("seed");
    let key = H256::repeat_byte(0x01);
    keeper
        .set_state(address, key, H256::repeat_byte(0x02))
        .expect("set state");

    keeper.delete_account(address).expect("delete");

    assert_eq!(keeper.get_balance(address).expect("balance"), U256::zero());
    assert_eq!(keeper.get_state(address, key).expect("state"), H256::zero());
    assert_eq!(keeper.get_code_hash(address).expect("hash"), EMPTY_KECCAK_HASH);
    assert_eq!(keeper.get_account(address).expect("account"), None);
    // The blob itself is content addressed and may be shared; it survives.
    assert!(keeper.get_code(account.info.code_hash).expect("code").is_some());
}

#[test]
fn code_is_content_addressed_and_shared() {
    let keeper = Keeper::in_memory();
    let code = Bytes::from_static(&[0x60, 0x01, 0x60, 0x02]);
    let hash = keccak(&code);
    keeper.set_code(hash, &code).expect("set code");

    for byte in [0x08u8, 0x09] {
        let address = Address::repeat_byte(byte);
        keeper
            .set_account(
                address,
                AccountInfo {
                    code_hash: hash,
                    ..Default::default()
                },
            )
            .expect("set account");
        assert_eq!(keeper.get_code_by_address(address).expect("code"), code);
    }
}

#[test]
fn iteration_is_ordered_and_early_exit_capable() {
    let keeper = Keeper::in_memory();
    let code = Bytes::from_static(&[0xfe]);
    for byte in [0x0c_u8, 0x0a, 0x0b] {
        keeper
            .seed_account(
                Address::repeat_byte(byte),
                &Account::new(U256::zero(), code.clone(), 1, BTreeMap::new()),
            )
            .expect("seed");
    }

    let mut seen = Vec::new();
    keeper
        .iterate_contracts(&mut |address, _| {
            seen.push(address);
            false
        })
        .expect("iterate");
    assert_eq!(
        seen,
        vec![
            Address::repeat_byte(0x0a),
            Address::repeat_byte(0x0b),
            Address::repeat_byte(0x0c)
        ]
    );

    let mut count = 0;
    keeper
        .iterate_contracts(&mut |_, _| {
            count += 1;
            true
        })
        .expect("iterate");
    assert_eq!(count, 1);

    let contract = Address::repeat_byte(0x0a);
    keeper
        .set_state(contract, H256::repeat_byte(0x01), H256::repeat_byte(0x11))
        .expect("set");
    keeper
        .set_state(contract, H256::repeat_byte(0x02), H256::repeat_byte(0x22))
        .expect("set");
    let mut slots = Vec::new();
    keeper
        .for_each_storage(contract, &mut |key, value| {
            slots.push((key, value));
            false
        })
        .expect("storage walk");
    assert_eq!(
        slots,
        vec![
            (H256::repeat_byte(0x01), H256::repeat_byte(0x11)),
            (H256::repeat_byte(0x02), H256::repeat_byte(0x22)),
        ]
    );
}

#[test]
fn isolated_copy_diverges_from_the_original() {
    let keeper = Keeper::in_memory();
    let address = Address::repeat_byte(0x0d);
    keeper.set_balance(address, U256::from(100u64)).expect("set");

    let copy = keeper.isolated_copy();
    copy.set_balance(address, U256::from(999u64)).expect("set");
    copy.set_state(address, H256::repeat_byte(0x01), H256::repeat_byte(0x02))
        .expect("set");

    assert_eq!(keeper.get_balance(address).expect("balance"), U256::from(100u64));
    assert_eq!(
        keeper
            .get_state(address, H256::repeat_byte(0x01))
            .expect("state"),
        H256::zero()
    );
}

#[test]
fn params_persist_and_reject_invalid_updates() {
    let keeper = Keeper::in_memory();
    let params = Params {
        enable_create: false,
        extra_eips: vec![3855],
        ..Default::default()
    };
    keeper.set_params(params.clone()).expect("set params");
    assert_eq!(keeper.params().expect("params"), params);

    let invalid = Params {
        denom_decimals: 7,
        ..Default::default()
    };
    assert!(keeper.set_params(invalid).is_err());
    // The stored copy is untouched.
    assert_eq!(keeper.params().expect("params"), params);
}
