use tokio_util::sync::{CancellationToken, DropGuard};

/// Creates a token that is cancelled when either `a` or `b` is cancelled.
///
/// Cancelling or dropping the returned token never touches its parents. The
/// guard cancels the linked token on drop, which also ends the relay task
/// that forwards `b`.
pub(crate) fn linked_token(
    a: &CancellationToken,
    b: &CancellationToken,
) -> (CancellationToken, DropGuard) {
    let linked = a.child_token();

    if b.is_cancelled() {
        linked.cancel();
    } else {
        let relay = linked.clone();
        let b = b.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = b.cancelled() => relay.cancel(),
                () = relay.cancelled() => {}
            }
        });
    }

    let guard = linked.clone().drop_guard();
    (linked, guard)
}
