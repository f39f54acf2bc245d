use base64::prelude::*;
use openssl::pkey::Public;
use openssl::rsa::Rsa;

// Parse from a RSA public key string into the associated RSA representation
pub fn parse_rsa(pem_data: &str) -> Result<Rsa<Public>, String> {
    // First decode the base64 data
    let pem_decoded = BASE64_STANDARD
        .decode(pem_data.trim())
        .map_err(|e| format!("Unable to decode base64 pem data: {}", e))?;

    // Convert the decoded data to a string
    let mut pem_string = String::from_utf8(pem_decoded)
        .map_err(|e| format!("Unable to convert decoded pem data into a string: {}", e))?;

    // Fix the header - replace PKCS1 header with PKCS8 header
    pem_string = pem_string
        .replace(
            "-----BEGIN RSA PUBLIC KEY-----",
            "-----BEGIN PUBLIC KEY-----",
        )
        .replace("-----END RSA PUBLIC KEY-----", "-----END PUBLIC KEY-----");

    // Parse the PEM string into an RSA public key using PKCS8 format
    let rsa_pubkey = Rsa::public_key_from_pem(pem_string.as_bytes())
        .map_err(|e| format!("Failed to parse RSA public key: {}", e))?;

    Ok(rsa_pubkey)
}

// Encode a RSA public key the way operators publish it on chain: base64 over a PEM document
// carrying the PKCS1 style header around a PKCS8 body
pub fn encode_rsa(rsa_pubkey: &Rsa<Public>) -> Result<String, String> {
    let pem = rsa_pubkey
        .public_key_to_pem()
        .map_err(|e| format!("Failed to encode RSA public key: {}", e))?;
    let pem_string = String::from_utf8(pem)
        .map_err(|e| format!("Unable to convert pem data into a string: {}", e))?
        .replace(
            "-----BEGIN PUBLIC KEY-----",
            "-----BEGIN RSA PUBLIC KEY-----",
        )
        .replace("-----END PUBLIC KEY-----", "-----END RSA PUBLIC KEY-----");

    Ok(BASE64_STANDARD.encode(pem_string))
}

// Trim an optional 0x prefix off a hex string
pub fn strip_hex_prefix(data: &str) -> &str {
    data.strip_prefix("0x")
        .or_else(|| data.strip_prefix("0X"))
        .unwrap_or(data)
}
