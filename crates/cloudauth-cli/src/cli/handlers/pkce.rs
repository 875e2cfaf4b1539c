//! PKCE pair generation handler

use crate::error::Result;
use crate::output::{json_output, print_field};
use cloudauth_sdk::PkcePair;
use serde::Serialize;

/// Generated pair as printed with `--json`
#[derive(Debug, Serialize)]
pub struct PkceReport {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: &'static str,
}

impl From<PkcePair> for PkceReport {
    fn from(pair: PkcePair) -> Self {
        Self {
            code_challenge_method: pair.method(),
            code_verifier: pair.verifier,
            code_challenge: pair.challenge,
        }
    }
}

/// Handle the `pkce` command
pub fn handle_pkce(length: usize, json: bool) -> Result<()> {
    let report = PkceReport::from(PkcePair::generate(length)?);

    if json {
        return json_output(&report);
    }

    print_field("code_verifier", &report.code_verifier);
    print_field("code_challenge", &report.code_challenge);
    print_field("code_challenge_method", report.code_challenge_method);
    Ok(())
}
