//! CRISP enrollment and exchange commands

use std::fs;

use anyhow::Context;
use idpake_crypto::crisp::{Exchange, Record, HELLO_BYTES};
use idpake_crypto::kdf::PwHashProfile;
use idpake_crypto::pake::cpace;
use idpake_crypto::Identity;

use crate::cli::{EnrollArgs, ExchangeArgs};
use crate::commands::{connect, write_record};
use crate::timing::Stages;

pub fn enroll(args: EnrollArgs) -> anyhow::Result<()> {
    let identity = Identity::new(args.identity.as_bytes())?;
    let profile = if args.interactive {
        PwHashProfile::INTERACTIVE
    } else {
        PwHashProfile::SENSITIVE
    };
    let record = Record::enroll(
        args.network.as_bytes(),
        args.password.as_bytes(),
        &identity,
        profile,
    )?;
    write_record(args.output.as_deref(), &record.to_bytes()?)
}

pub async fn exchange(args: ExchangeArgs) -> anyhow::Result<()> {
    let mut stages = Stages::new(!args.no_timing);

    stages.start_offline("Loading password file");
    let bytes = fs::read(&args.record)
        .with_context(|| format!("reading {}", args.record.display()))?;
    let record = Record::from_bytes(&bytes)?;
    tracing::debug!(identity = %record.identity(), "loaded enrollment record");

    stages.start_offline("Blinding");
    let exchange = Exchange::start(&record)?;
    let hello = exchange.hello();

    stages.start_offline("Connecting");
    let mut channel = connect(args.ip, args.port).await?;

    stages.start("Exchanging messages");
    channel.send(&[&hello]).await?;
    let mut peer_hello = [0u8; HELLO_BYTES];
    channel.recv(&mut peer_hello).await?;

    stages.start("Computing shared secret");
    let (agreement, verifier) = exchange.receive(&peer_hello)?;

    stages.start("Running PAKE (1)");
    channel.send(&[&agreement.message()]).await?;

    // Check the peer's identity proof while its PAKE message is in flight.
    stages.start("Verifying identity");
    verifier.verify()?;
    println!("Identified: {}", agreement.peer_identity());

    stages.start("Receiving PAKE message");
    let mut peer_msg = [0u8; cpace::MSG_BYTES];
    channel.recv(&mut peer_msg).await?;

    stages.start("Running PAKE (2)");
    let key = agreement.finish(&peer_msg)?;

    stages.finish();
    println!("Shared key: {}", hex::encode(key));
    Ok(())
}
