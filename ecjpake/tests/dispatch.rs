//! Admission, cancellation and completion discipline tests.

#![cfg(feature = "soft-pka")]

use core::time::Duration;
use ecjpake::{
    CurveParams, Ecjpake, Error, GenerateZkp, KeyMaterial, NIST_P256, NoKeyStore, OperationKind,
    Params, Pka, ReturnBehavior, RoundOneGenerateKeys, RoundTwoGenerateKeys, SoftPka,
};
use hex_literal::hex;
use std::sync::{Arc, Mutex};

const X1: [u8; 32] = hex!("5c6b8fa9e2d1a4c03f96b7e01d2c8a7f4e3b2a19087f6e5d4c3b2a1908f7e6d5");
const X2: [u8; 32] = hex!("0f1e2d3c4b5a69788796a5b4c3d2e1f00112233445566778899aabbccddeeff0");
const V1: [u8; 32] = hex!("3a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f6071829");
const V2: [u8; 32] = hex!("1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef");

type Log = Arc<Mutex<Vec<(OperationKind, Result<(), Error>)>>>;

fn round_one() -> RoundOneGenerateKeys {
    RoundOneGenerateKeys::new(
        &NIST_P256,
        KeyMaterial::plaintext(X1),
        KeyMaterial::plaintext(X2),
        KeyMaterial::plaintext(V1),
        KeyMaterial::plaintext(V2),
    )
}

fn polling() -> Ecjpake<SoftPka> {
    Ecjpake::new(SoftPka::new().with_latency(2), NoKeyStore, Params::polling()).unwrap()
}

/// Callback-mode instance recording every completion it is handed.
fn with_callback(latency: u32) -> (Ecjpake<SoftPka>, Log) {
    let log = Log::default();
    let sink = log.clone();
    let params = Params::callback(move |_: &mut Ecjpake<SoftPka>, done| {
        sink.lock().unwrap().push((done.kind, done.status));
    });
    let driver = Ecjpake::new(SoftPka::new().with_latency(latency), NoKeyStore, params).unwrap();
    (driver, log)
}

/// Platform interrupt vector stand-in.
fn service(driver: &mut Ecjpake<SoftPka>) {
    while driver.is_busy() {
        if driver.pka().interrupt_pending() {
            driver.on_interrupt();
        }
    }
}

#[test]
fn callback_mode_needs_a_callback() {
    let params = Params {
        return_behavior: ReturnBehavior::Callback,
        callback: None,
        timeout: None,
    };
    assert_eq!(
        Ecjpake::new(SoftPka::new(), NoKeyStore, params).unwrap_err(),
        Error::Failed
    );
}

#[test]
fn default_params_block() {
    let driver = Ecjpake::new(SoftPka::new(), NoKeyStore, Params::default()).unwrap();
    assert_eq!(driver.return_behavior(), ReturnBehavior::Blocking);
}

#[test]
fn populated_output_is_rejected() {
    let mut driver = polling();
    let mut op = round_one();
    op.my_public_v2 = KeyMaterial::plaintext([4u8; 65]);

    let done = driver.round_one_generate_keys(op);
    assert_eq!(done.status, Err(Error::OutputKeyNotBlank));
    assert!(done.operation.is_some());
    assert!(!driver.is_busy());
    assert_eq!(driver.pka().power_holds(), 0);
    assert_eq!(driver.pka().scalar_multiplications(), 0);
}

#[test]
fn unsupported_curve_is_rejected() {
    static EMPTY: CurveParams = CurveParams {
        name: "empty",
        length: 0,
        prime: &[],
        a: &[],
        b: &[],
        order: &[],
        generator_x: &[],
        generator_y: &[],
    };

    let mut driver = polling();
    let op = RoundOneGenerateKeys::new(
        &EMPTY,
        KeyMaterial::plaintext(Vec::new()),
        KeyMaterial::plaintext(Vec::new()),
        KeyMaterial::plaintext(Vec::new()),
        KeyMaterial::plaintext(Vec::new()),
    );
    assert_eq!(driver.round_one_generate_keys(op).status, Err(Error::Failed));
}

#[test]
fn completion_releases_the_accelerator() {
    let mut driver = polling();
    let done = driver.round_one_generate_keys(round_one());
    assert_eq!(done.status, Ok(()));

    let pka = driver.pka();
    assert_eq!(pka.power_holds(), 0);
    assert_eq!(pka.ram_clears(), 1);
    assert!(!pka.interrupt_enabled());
    assert_eq!(pka.scalar_multiplications(), 4);
}

#[test]
fn second_submission_is_rejected_while_busy() {
    let (mut driver, log) = with_callback(5);

    let pending = driver.round_one_generate_keys(round_one());
    assert!(pending.is_pending());
    assert!(driver.is_busy());

    let rejected = driver.generate_zkp(GenerateZkp::new(
        &NIST_P256,
        KeyMaterial::plaintext(X1),
        KeyMaterial::plaintext(V1),
        [1u8; 32],
    ));
    assert_eq!(rejected.kind, OperationKind::GenerateZkp);
    assert_eq!(rejected.status, Err(Error::ResourceUnavailable));
    assert!(rejected.operation.is_some());
    assert!(log.lock().unwrap().is_empty());

    service(&mut driver);
    assert_eq!(
        *log.lock().unwrap(),
        [(OperationKind::RoundOneGenerateKeys, Ok(()))]
    );
}

#[test]
fn cancel_reports_canceled_and_frees_the_engine() {
    let (mut driver, log) = with_callback(50);

    assert_eq!(driver.cancel_operation(), Err(Error::Failed));

    driver.round_one_generate_keys(round_one());
    // Run the first step so an accelerator operation is in flight.
    driver.on_interrupt();
    assert!(driver.is_busy());

    assert_eq!(driver.cancel_operation(), Ok(()));
    assert!(!driver.is_busy());
    assert_eq!(
        *log.lock().unwrap(),
        [(OperationKind::RoundOneGenerateKeys, Err(Error::Canceled))]
    );

    let pka = driver.pka();
    assert_eq!(pka.aborts(), 1);
    assert_eq!(pka.power_holds(), 0);
    assert!(!pka.interrupt_enabled());

    driver.round_one_generate_keys(round_one());
    service(&mut driver);
    assert_eq!(
        log.lock().unwrap().last(),
        Some(&(OperationKind::RoundOneGenerateKeys, Ok(())))
    );
}

#[test]
fn callback_can_chain_the_next_operation() {
    let log = Log::default();
    let sink = log.clone();
    let params = Params::callback(move |driver: &mut Ecjpake<SoftPka>, done| {
        sink.lock().unwrap().push((done.kind, done.status));
        if done.kind == OperationKind::RoundOneGenerateKeys {
            let keys: RoundOneGenerateKeys = done.into_output().unwrap();
            let next = driver.generate_zkp(GenerateZkp::new(
                keys.curve,
                keys.my_private_key1,
                keys.my_private_v1,
                [7u8; 32],
            ));
            assert!(next.is_pending());
        }
    });
    let mut driver = Ecjpake::new(SoftPka::new().with_latency(3), NoKeyStore, params).unwrap();

    driver.round_one_generate_keys(round_one());
    service(&mut driver);

    assert_eq!(
        *log.lock().unwrap(),
        [
            (OperationKind::RoundOneGenerateKeys, Ok(())),
            (OperationKind::GenerateZkp, Ok(())),
        ]
    );
}

#[test]
fn cancel_from_callback_is_delivered() {
    let log = Log::default();
    let sink = log.clone();
    let params = Params::callback(move |driver: &mut Ecjpake<SoftPka>, done| {
        if done.kind == OperationKind::GenerateZkp {
            let proof: GenerateZkp = done.operation.unwrap().try_into().unwrap();
            assert_eq!(proof.hash, [7u8; 32]);
            sink.lock().unwrap().push((done.kind, done.status));
            return;
        }
        sink.lock().unwrap().push((done.kind, done.status));
        let next = driver.generate_zkp(GenerateZkp::new(
            &NIST_P256,
            KeyMaterial::plaintext(X1),
            KeyMaterial::plaintext(V1),
            [7u8; 32],
        ));
        assert!(next.is_pending());
        assert_eq!(driver.cancel_operation(), Ok(()));
        assert!(!driver.is_busy());
    });
    let mut driver = Ecjpake::new(SoftPka::new().with_latency(3), NoKeyStore, params).unwrap();

    driver.round_one_generate_keys(round_one());
    service(&mut driver);

    assert_eq!(
        *log.lock().unwrap(),
        [
            (OperationKind::RoundOneGenerateKeys, Ok(())),
            (OperationKind::GenerateZkp, Err(Error::Canceled)),
        ]
    );
    assert!(!driver.is_busy());
    assert_eq!(driver.pka().power_holds(), 0);
}

#[test]
fn blocking_timeout_cancels() {
    let mut pka = SoftPka::new();
    pka.stall();
    let params = Params::blocking(Some(Duration::from_millis(1)));
    let mut driver = Ecjpake::new(pka, NoKeyStore, params).unwrap();

    let done = driver.round_one_generate_keys(round_one());
    assert_eq!(done.status, Err(Error::Canceled));
    assert!(!driver.is_busy());
    assert_eq!(driver.pka().aborts(), 1);

    // Abort recovered the accelerator.
    let done = driver.round_one_generate_keys(round_one());
    assert_eq!(done.status, Ok(()));
}

#[test]
fn pre_shared_secret_bounds() {
    let mut driver = polling();
    let keys: RoundOneGenerateKeys = driver
        .round_one_generate_keys(round_one())
        .into_output()
        .unwrap();

    for (secret, expected) in [
        (Vec::new(), Err(Error::Failed)),
        (vec![0x5a; 161], Err(Error::Failed)),
        (vec![0x5a; 160], Ok(())),
    ] {
        let op = RoundTwoGenerateKeys::new(
            &NIST_P256,
            keys.my_private_key2.clone(),
            keys.my_private_v2.clone(),
            KeyMaterial::plaintext(secret),
            keys.my_public_key1.clone(),
            keys.my_public_key2.clone(),
            keys.my_public_v1.clone(),
            keys.my_public_v2.clone(),
        );
        assert_eq!(driver.round_two_generate_keys(op).status, expected);
    }
}

#[test]
fn close_cancels_in_flight_operation() {
    let (mut driver, log) = with_callback(50);
    driver.round_one_generate_keys(round_one());
    driver.on_interrupt();

    let (pka, NoKeyStore) = driver.close();
    assert_eq!(pka.aborts(), 1);
    assert_eq!(pka.power_holds(), 0);
    assert_eq!(
        *log.lock().unwrap(),
        [(OperationKind::RoundOneGenerateKeys, Err(Error::Canceled))]
    );
}
