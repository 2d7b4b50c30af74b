//! NAS message protection (3GPP TS 24.501 4.4.3, TS 33.501 6.4)
//!
//! [`encrypt`] turns a plain message into a security protected container
//! under the context's send count; [`decrypt`] verifies and unwraps a
//! received container under the receive count.
//!
//! The payload is ciphered first and the MAC is computed over
//! `SQN || ciphered payload`, so the receiver checks exactly the octets that
//! were transmitted. Neither operation touches the context until every
//! fallible step has succeeded.

use nassec_common::logging::{format_hex_compact, log_nas_message, Direction, HexDump};
use tracing::{debug, warn};

use crate::context::NasSecurityContext;
use crate::enums::SecurityHeaderType;
use crate::message::NasMessage;
use crate::security::{
    apply_nas_cipher, compute_nas_mac, constant_time_eq, SecuredNasMessage, SecurityError,
};

/// Security header type used to send `message` under `ctx`
pub fn classify_header(message: &NasMessage, ctx: &NasSecurityContext) -> SecurityHeaderType {
    let keys = ctx.keys();
    if !keys.has_any_nas_key() {
        SecurityHeaderType::NotProtected
    } else if message.is_security_mode_complete() {
        SecurityHeaderType::IntegrityProtectedAndCipheredWithNewSecurityContext
    } else if keys.knas_enc().is_some() {
        SecurityHeaderType::IntegrityProtectedAndCiphered
    } else {
        SecurityHeaderType::IntegrityProtected
    }
}

fn ensure_active(ctx: &NasSecurityContext) -> Result<(), SecurityError> {
    if ctx.is_active() {
        Ok(())
    } else {
        Err(SecurityError::SecurityContextNotActive(ctx.state()))
    }
}

/// Protect a plain message and advance the send count.
pub fn encrypt(
    message: &NasMessage,
    ctx: &mut NasSecurityContext,
) -> Result<SecuredNasMessage, SecurityError> {
    ensure_active(ctx)?;

    let header_type = classify_header(message, ctx);
    let algorithms = ctx.algorithms();
    let count = ctx.send_count();
    let bearer = ctx.bearer();
    let direction = ctx.endpoint().send_direction();

    let mut payload = message.encode();
    log_nas_message(Direction::Tx, &format!("{:?}", message.message_type()), &payload);

    let mac = if header_type.is_protected() {
        if header_type.is_ciphered() {
            apply_nas_cipher(
                algorithms.ciphering,
                ctx.keys().knas_enc(),
                count,
                bearer,
                direction,
                &mut payload,
            )?;
        }
        compute_nas_mac(
            algorithms.integrity,
            ctx.keys().knas_int(),
            count,
            bearer,
            direction,
            &payload,
        )?
    } else {
        [0u8; 4]
    };

    debug!(
        count = %count,
        ?direction,
        header_type = ?header_type,
        mac = %HexDump(&mac),
        "NAS message protected"
    );

    ctx.advance_on_send()?;
    Ok(SecuredNasMessage::new(header_type, mac, count.sqn, payload))
}

/// Verify and unwrap a received container.
///
/// Returns `Ok(None)` when the message is rejected: wrong MAC, a replayed
/// count, a plain container under an established context, or NIA0 while
/// null integrity is gated. The receive count only moves when a message is
/// returned.
pub fn decrypt(
    secured: &SecuredNasMessage,
    ctx: &mut NasSecurityContext,
) -> Result<Option<NasMessage>, SecurityError> {
    ensure_active(ctx)?;

    let algorithms = ctx.algorithms();
    let sqn = secured.sequence_number;
    let count = ctx.estimate_receive_count(sqn)?;
    let bearer = ctx.bearer();
    let direction = ctx.endpoint().receive_direction();
    let header_type = secured.security_header_type;

    if header_type.is_protected() {
        if algorithms.integrity.is_null() && ctx.gate_null_integrity() {
            warn!(count = %count, "NAS message rejected: null integrity is gated");
            return Ok(None);
        }

        let expected = compute_nas_mac(
            algorithms.integrity,
            ctx.keys().knas_int(),
            count,
            bearer,
            direction,
            &secured.payload,
        )?;
        debug!(
            count = %count,
            received = %HexDump(&secured.mac),
            expected = %HexDump(&expected),
            "checking NAS MAC"
        );
        if !algorithms.integrity.is_null() && !constant_time_eq(&expected, &secured.mac) {
            warn!(
                count = %count,
                received = %format_hex_compact(&secured.mac, 2),
                "NAS message rejected: MAC mismatch"
            );
            return Ok(None);
        }
    } else if ctx.keys().has_any_nas_key() {
        warn!(count = %count, "NAS message rejected: not protected");
        return Ok(None);
    }

    if ctx.has_accepted_receive() && count <= ctx.receive_count() {
        warn!(
            count = %count,
            last = %ctx.receive_count(),
            "NAS message rejected: replayed count"
        );
        return Ok(None);
    }

    let mut plain = secured.payload.clone();
    if header_type.is_ciphered() {
        apply_nas_cipher(
            algorithms.ciphering,
            ctx.keys().knas_enc(),
            count,
            bearer,
            direction,
            &mut plain,
        )?;
    }
    let message = NasMessage::decode(&plain)?;
    log_nas_message(Direction::Rx, &format!("{:?}", message.message_type()), &plain);

    ctx.advance_on_receive(sqn)?;
    Ok(Some(message))
}
