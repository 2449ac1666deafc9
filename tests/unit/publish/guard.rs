use super::*;

#[test]
fn second_begin_is_refused_while_in_flight() {
    let guard = PublishGuard::new();
    let ticket = guard.try_begin().unwrap();
    assert_eq!(guard.state(), PublishState::InFlight);
    assert!(guard.try_begin().is_none());
    ticket.complete();
    assert_eq!(guard.state(), PublishState::Done);
    assert!(guard.try_begin().is_none());
}

#[test]
fn dropped_ticket_returns_to_idle() {
    let guard = PublishGuard::new();
    {
        let _ticket = guard.try_begin().unwrap();
    }
    assert_eq!(guard.state(), PublishState::Idle);
    assert!(guard.try_begin().is_some());
}

#[test]
fn only_one_thread_wins() {
    let guard = std::sync::Arc::new(PublishGuard::new());
    let wins: usize = (0..8)
        .map(|_| {
            let g = guard.clone();
            std::thread::spawn(move || match g.try_begin() {
                Some(t) => {
                    t.complete();
                    1
                }
                None => 0,
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .sum();
    assert_eq!(wins, 1);
    assert_eq!(guard.state(), PublishState::Done);
}
