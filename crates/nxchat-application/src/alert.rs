//! Notification sounds for incoming replies.

use nxchat_core::error::Result;

/// Plays the widget's notification sounds.
pub trait AlertPlayer: Send + Sync {
    /// The tenant's notification chime.
    fn play_chime(&self) -> Result<()>;

    /// A plain synthesized tone, used when the chime cannot be played.
    fn play_tone(&self) -> Result<()>;
}

/// Plays nothing. The default for headless embeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAlertPlayer;

impl AlertPlayer for NoopAlertPlayer {
    fn play_chime(&self) -> Result<()> {
        Ok(())
    }

    fn play_tone(&self) -> Result<()> {
        Ok(())
    }
}

/// Plays the chime, falling back to the tone, then giving up silently.
///
/// Returns whether any sound was played.
pub fn notify(player: &dyn AlertPlayer) -> bool {
    let chime_err = match player.play_chime() {
        Ok(()) => return true,
        Err(e) => e,
    };
    tracing::debug!("[Alert] Chime failed, falling back to tone: {}", chime_err);

    match player.play_tone() {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("[Alert] Tone failed, giving up: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxchat_core::error::NxChatError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyPlayer {
        chime_ok: bool,
        tone_ok: bool,
        tones: AtomicUsize,
    }

    impl AlertPlayer for FlakyPlayer {
        fn play_chime(&self) -> Result<()> {
            if self.chime_ok {
                Ok(())
            } else {
                Err(NxChatError::internal("no audio device"))
            }
        }

        fn play_tone(&self) -> Result<()> {
            self.tones.fetch_add(1, Ordering::SeqCst);
            if self.tone_ok {
                Ok(())
            } else {
                Err(NxChatError::internal("no audio device"))
            }
        }
    }

    fn player(chime_ok: bool, tone_ok: bool) -> FlakyPlayer {
        FlakyPlayer {
            chime_ok,
            tone_ok,
            tones: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_chime_played() {
        let p = player(true, true);
        assert!(notify(&p));
        assert_eq!(p.tones.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_falls_back_to_tone() {
        let p = player(false, true);
        assert!(notify(&p));
        assert_eq!(p.tones.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_gives_up_silently() {
        assert!(!notify(&player(false, false)));
        assert!(notify(&NoopAlertPlayer));
    }
}
