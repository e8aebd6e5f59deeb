use std::time::Duration;

use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a pointer gesture against the crop canvas. `Up` also stands
/// in for the pointer leaving the canvas mid-gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A pointer sample already mapped into canvas pixel coordinates (see
/// [`crate::geometry::pointer_to_canvas`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
}

/// Marker sent by the editor whenever the crop preview needs repainting.
#[derive(Debug, Clone, Copy)]
pub struct RedrawRequest;

/// Collapses bursts of redraw requests to at most one `redraw` call per tick.
/// Pointer-move streams arrive far faster than a display refreshes; dropping
/// the intermediate frames changes nothing visible.
///
/// A request pending at shutdown (cancel or channel close) is flushed so the
/// last gesture is never lost.
pub async fn coalesce_redraws<F>(
    mut requests: Receiver<RedrawRequest>,
    period: Duration,
    cancel: CancellationToken,
    mut redraw: F,
) where
    F: FnMut(),
{
    let mut tick = tokio::time::interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut pending = false;

    loop {
        select! {
            _ = cancel.cancelled() => break,

            maybe = requests.recv() => match maybe {
                Some(RedrawRequest) => pending = true,
                None => break,
            },

            _ = tick.tick() => {
                if pending {
                    redraw();
                    pending = false;
                }
            }
        }
    }

    if pending {
        redraw();
    }
}
