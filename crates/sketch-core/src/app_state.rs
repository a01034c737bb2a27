//! Queues and notifications shared between the demo tasks

use core::future::Future;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::warn;
use thiserror_no_std::Error;

use crate::sensors::SensorEvent;

/// Depth of every sensor queue.
pub const QUEUE_SIZE: usize = 10;

pub type SensorQueue = Channel<CriticalSectionRawMutex, SensorEvent, QUEUE_SIZE>;

/// One-slot notification. Raising it again before the waiter runs has no
/// further effect.
pub type Notification = Signal<CriticalSectionRawMutex, ()>;

/// BMP180 producer to display/log consumer
pub static PRESSURE_QUEUE: SensorQueue = Channel::new();
/// DS3231 producer to display/log consumer
pub static CLOCK_QUEUE: SensorQueue = Channel::new();

/// Raised by the periodic timer task
pub static TIMER_NOTIFY: Notification = Signal::new();
/// Raised on every button falling edge
pub static BUTTON_NOTIFY: Notification = Signal::new();
/// Latest battery charge in percent. A newer value replaces an unread one.
pub static BATTERY_LEVEL: Signal<CriticalSectionRawMutex, u8> = Signal::new();

static DROPPED_EVENTS: AtomicU32 = AtomicU32::new(0);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue full, {sensor} event dropped")]
    Full { sensor: &'static str },
    #[error("timed out waiting for queue space, {sensor} event dropped")]
    Timeout { sensor: &'static str },
}

/// Enqueue without waiting. A full queue drops the event and counts it.
pub fn try_publish(queue: &SensorQueue, event: SensorEvent) -> Result<(), QueueError> {
    let source = event.source();
    queue.try_send(event).map_err(|_| {
        let dropped = DROPPED_EVENTS.fetch_add(1, Ordering::Relaxed) + 1;
        warn!("{} queue full, event dropped ({} total)", source, dropped);
        QueueError::Full { sensor: source }
    })
}

/// Enqueue, waiting for space until `timeout` completes.
///
/// The firmware passes `embassy_time::Timer::after(..)` as `timeout`.
pub async fn publish_timeout<F>(
    queue: &SensorQueue,
    event: SensorEvent,
    timeout: F,
) -> Result<(), QueueError>
where
    F: Future,
{
    let source = event.source();
    match select(queue.send(event), timeout).await {
        Either::First(()) => Ok(()),
        Either::Second(_) => {
            DROPPED_EVENTS.fetch_add(1, Ordering::Relaxed);
            warn!("{} queue stayed full, event dropped", source);
            Err(QueueError::Timeout { sensor: source })
        }
    }
}

/// Events dropped since boot on any queue.
pub fn dropped_events() -> u32 {
    DROPPED_EVENTS.load(Ordering::Relaxed)
}

/// Raise a notification, as an ISR or timer callback would.
pub fn notify(notification: &Notification) {
    notification.signal(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::PressureReading;
    use core::future::{pending, ready};
    use embassy_futures::block_on;

    fn pressure(pa: u32) -> SensorEvent {
        SensorEvent::Pressure(PressureReading {
            temperature_decicelsius: 215,
            pressure_pa: pa,
        })
    }

    #[test]
    fn full_queue_drops_newest_event() {
        let queue = SensorQueue::new();
        for i in 0..QUEUE_SIZE as u32 {
            try_publish(&queue, pressure(i)).unwrap();
        }
        let before = dropped_events();
        assert_eq!(
            try_publish(&queue, pressure(99)),
            Err(QueueError::Full { sensor: "BMP180" })
        );
        assert!(dropped_events() > before);

        // FIFO order survives and the dropped event never shows up
        for i in 0..QUEUE_SIZE as u32 {
            assert_eq!(queue.try_receive().ok(), Some(pressure(i)));
        }
        assert!(queue.try_receive().is_err());
    }

    #[test]
    fn publish_waits_only_until_timeout() {
        let queue = SensorQueue::new();
        for i in 0..QUEUE_SIZE as u32 {
            try_publish(&queue, pressure(i)).unwrap();
        }
        let result = block_on(publish_timeout(&queue, pressure(42), ready(())));
        assert_eq!(result, Err(QueueError::Timeout { sensor: "BMP180" }));
        assert_eq!(queue.len(), QUEUE_SIZE);
    }

    #[test]
    fn publish_with_room_succeeds() {
        let queue = SensorQueue::new();
        block_on(publish_timeout(&queue, pressure(1), pending::<()>())).unwrap();
        assert_eq!(queue.try_receive().ok(), Some(pressure(1)));
    }

    #[test]
    fn repeated_notifications_coalesce() {
        let notification = Notification::new();
        notify(&notification);
        notify(&notification);
        notify(&notification);
        assert!(notification.signaled());
        block_on(notification.wait());
        assert!(!notification.signaled(), "three raises wake the waiter once");
    }

    #[test]
    fn battery_level_keeps_latest_value() {
        let level: Signal<CriticalSectionRawMutex, u8> = Signal::new();
        level.signal(80);
        level.signal(79);
        assert_eq!(level.try_take(), Some(79));
        assert_eq!(level.try_take(), None);
    }
}
