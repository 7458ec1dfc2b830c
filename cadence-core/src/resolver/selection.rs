//! Audio stream selection over provider candidates.

use super::locator::{CandidateStream, CodecFamily};

/// Picks the stream to relay.
///
/// Candidates are scanned in provider order. The first playable audio-only
/// stream of the preferred family wins; failing that, the first playable
/// audio-only stream of any family. Streams carrying video are never chosen,
/// nor are manifest-protocol streams whose URL names a playlist.
pub fn select_audio_stream(
    candidates: &[CandidateStream],
    preferred: CodecFamily,
) -> Option<&CandidateStream> {
    let playable = |candidate: &&CandidateStream| {
        candidate.url.is_some() && candidate.is_audio_only() && candidate.is_progressive()
    };

    candidates
        .iter()
        .filter(playable)
        .find(|candidate| candidate.codec_family() == Some(preferred))
        .or_else(|| candidates.iter().find(playable))
}
