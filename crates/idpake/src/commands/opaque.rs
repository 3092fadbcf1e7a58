//! OPAQUE enrollment, client and server commands

use std::fs;

use anyhow::Context;
use idpake_crypto::opaque::{
    self, Client, Request, ServerFile, REQUEST_BYTES, RESPONSE_BYTES, TAG_BYTES,
};
use idpake_crypto::Identity;

use crate::cli::{OpaqueClientArgs, OpaqueEnrollArgs, OpaqueServerArgs};
use crate::commands::{connect, write_record};
use crate::timing::Stages;

pub fn enroll(args: OpaqueEnrollArgs) -> anyhow::Result<()> {
    let OpaqueEnrollArgs {
        network: _,
        password,
        identity,
        output_dir,
        output,
    } = args;

    let identity = Identity::new(identity.as_bytes())?;
    let file = ServerFile::enroll(password.as_bytes())?;

    match output_dir {
        Some(dir) => {
            let path = dir.join(opaque::record_filename(&identity)?);
            fs::write(&path, file.to_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            Ok(())
        }
        None => write_record(output.as_deref(), &file.to_bytes()),
    }
}

pub async fn client(args: OpaqueClientArgs) -> anyhow::Result<()> {
    let mut stages = Stages::new(!args.no_timing);

    stages.start("Generating user msg");
    let identity = Identity::new(args.identity.as_bytes())?;
    let (client, request) = Client::start(args.password.as_bytes(), &identity)?;

    stages.start_offline("Connecting");
    let mut channel = connect(args.ip, args.port).await?;

    stages.start("Exchanging messages #1");
    channel.send(&[&request]).await?;
    let mut response = [0u8; RESPONSE_BYTES];
    channel.recv(&mut response).await?;

    stages.start("Generating key");
    let (session_key, tag) = client.finish(&response)?;

    stages.start("Sending message #2");
    channel.send(&[&tag]).await?;

    stages.finish();
    println!("Shared key: {}", hex::encode(session_key));
    Ok(())
}

pub async fn server(args: OpaqueServerArgs) -> anyhow::Result<()> {
    let mut stages = Stages::new(!args.no_timing);

    stages.start_offline("Connecting");
    let mut channel = connect(args.ip, args.port).await?;

    stages.start("Receiving user msg #1");
    let mut request = [0u8; REQUEST_BYTES];
    channel.recv(&mut request).await?;

    stages.start("Validating points");
    let request = Request::parse(&request)?;
    tracing::debug!(sid = %request.sid(), "client request parsed");

    stages.start("Loading password file");
    let path = args.dir.join(opaque::record_filename(request.sid())?);
    let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let file = ServerFile::from_bytes(&bytes)?;

    stages.start("Generating key");
    let (pending, response) = file.respond(&request)?;

    stages.start("Exchanging messages");
    channel.send(&[&response]).await?;
    let mut tag = [0u8; TAG_BYTES];
    channel.recv(&mut tag).await?;

    stages.start("Validating key");
    let session_key = pending.confirm(&tag)?;

    stages.finish();
    println!("Shared key: {}", hex::encode(session_key));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OpaqueEnrollArgs;

    #[test]
    fn test_enroll_writes_server_layout() {
        let dir = tempfile::tempdir().unwrap();
        enroll(OpaqueEnrollArgs {
            network: "demo".into(),
            password: "hunter2".into(),
            identity: "Alice".into(),
            output_dir: Some(dir.path().to_path_buf()),
            output: None,
        })
        .unwrap();

        let bytes = fs::read(dir.path().join("alice.pwd")).unwrap();
        assert!(ServerFile::from_bytes(&bytes).is_ok());
    }
}
