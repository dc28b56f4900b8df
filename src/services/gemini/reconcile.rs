//! Conversation-history reconciliation.
//!
//! Decides, turn by turn, which prior chat turns are replayed verbatim to a
//! stateful conversational model, which are stripped of image payloads,
//! which are dropped, and how the most recent generated image is attached as
//! edit context for the new request. The output sequence always alternates
//! user/model and never ends on a model turn.

use super::types::{InlineData, ModelKind, Part, ProviderTurn, Speaker, Turn};

/// Upload ceiling for newly attached reference images. Applied to both
/// conversational paths; the carried-forward generated image does not count
/// against it.
pub const MAX_UPLOAD_ATTACHMENTS: usize = 14;

/// Stand-in text for a turn that would otherwise have no parts. The provider
/// rejects empty part lists.
const EMPTY_TURN_PLACEHOLDER: &str = "...";

/// Provenance check for the professional model. True iff the label contains
/// a "3" followed by "Pro", case-insensitive. The label is a client-recorded
/// string: this substring match is the contract, and a known trust boundary.
pub fn is_professional_label(label: &str) -> bool {
    let lower = label.to_ascii_lowercase();
    match lower.find('3') {
        Some(idx) => lower[idx..].contains("pro"),
        None => false,
    }
}

/// Build the provider-bound turn sequence for a refinement request.
///
/// The professional model is continuation-sensitive: its own turns must be
/// replayed verbatim (provenance marker included) and turns from any other
/// model must not be replayed at all. The economy model has no such
/// constraint and gets a deterministic reconstruction from display data.
pub fn reconcile_history(
    history: &[Turn],
    message: &str,
    attachments: &[InlineData],
    model: ModelKind,
) -> Vec<ProviderTurn> {
    match model {
        ModelKind::Gemini3Pro => reconcile_professional(history, message, attachments),
        _ => reconcile_reconstructed(history, message, attachments),
    }
}

fn reconcile_professional(
    history: &[Turn],
    message: &str,
    attachments: &[InlineData],
) -> Vec<ProviderTurn> {
    let mut contents: Vec<ProviderTurn> = Vec::new();
    // Only the most recent generated image across the whole history is
    // forwarded as edit context; every model turn with images overwrites it.
    let mut last_generated: Option<InlineData> = None;

    for turn in history {
        match turn.role {
            Speaker::Model => {
                if let Some(image) = turn.images.last() {
                    last_generated = Some(image.inline_data());
                }

                // A turn is safe to replay only if one of its images carries
                // the professional label. Text-only model turns have no
                // trustworthy label and are always dropped, even with rich
                // text. Deliberate stability trade-off: replaying a turn of
                // unverifiable origin makes the provider reject the request.
                let valid = turn.images.iter().any(|img| is_professional_label(&img.model));

                if valid {
                    let parts = match &turn.provider_parts {
                        Some(parts) if !parts.is_empty() => parts.clone(),
                        // Legacy/seeded turns without raw parts: replay a
                        // reconstruction. It carries no provenance marker.
                        _ => rebuild_display_parts(turn),
                    };
                    contents.push(ProviderTurn {
                        role: Speaker::Model,
                        parts,
                    });
                } else {
                    log::debug!("Dropping model turn without professional provenance");
                    // Dropping a model turn orphans the user turn before it;
                    // remove it too or the sequence ends up user-user.
                    if contents.last().map(|t| t.role) == Some(Speaker::User) {
                        contents.pop();
                    }
                }
            }
            Speaker::User => {
                // User history is forwarded text-only; binary attachments
                // from earlier requests are not resent.
                let mut parts: Vec<Part> = match &turn.provider_parts {
                    Some(existing) => existing.iter().filter(|p| p.is_text()).cloned().collect(),
                    None => turn
                        .text
                        .as_deref()
                        .filter(|t| !t.is_empty())
                        .map(|t| vec![Part::text(t)])
                        .unwrap_or_default(),
                };
                if parts.is_empty() {
                    parts.push(Part::text(EMPTY_TURN_PLACEHOLDER));
                }
                // Tentative: removed again if the following model turn turns
                // out invalid.
                contents.push(ProviderTurn {
                    role: Speaker::User,
                    parts,
                });
            }
        }
    }

    let mut current = vec![Part::text(message)];
    if let Some(image) = last_generated {
        // "Edit this image": the newest generated image rides along with the
        // new request instead of being replayed inside history.
        current.push(Part::inline(image));
    }
    for attachment in attachments.iter().take(MAX_UPLOAD_ATTACHMENTS) {
        current.push(Part::inline(attachment.clone()));
    }

    match contents.last_mut() {
        // A trailing user turn means its model response was dropped (or the
        // walk ended on one); merge instead of producing user-user.
        Some(last) if last.role == Speaker::User => last.parts.extend(current),
        _ => contents.push(ProviderTurn {
            role: Speaker::User,
            parts: current,
        }),
    }

    contents
}

fn reconcile_reconstructed(
    history: &[Turn],
    message: &str,
    attachments: &[InlineData],
) -> Vec<ProviderTurn> {
    let mut contents: Vec<ProviderTurn> = history
        .iter()
        .map(|turn| ProviderTurn {
            role: turn.role,
            parts: rebuild_display_parts(turn),
        })
        .collect();

    let mut current = vec![Part::text(message)];
    for attachment in attachments.iter().take(MAX_UPLOAD_ATTACHMENTS) {
        current.push(Part::inline(attachment.clone()));
    }
    contents.push(ProviderTurn {
        role: Speaker::User,
        parts: current,
    });

    contents
}

/// Rebuild provider parts from what the turn displays: text first, then one
/// inline attachment per image. Ignores `provider_parts` entirely.
fn rebuild_display_parts(turn: &Turn) -> Vec<Part> {
    let mut parts = Vec::new();
    if let Some(text) = turn.text.as_deref() {
        if !text.is_empty() {
            parts.push(Part::text(text));
        }
    }
    for image in &turn.images {
        parts.push(Part::inline(image.inline_data()));
    }
    if parts.is_empty() {
        parts.push(Part::text(EMPTY_TURN_PLACEHOLDER));
    }
    parts
}
