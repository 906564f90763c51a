//! Listener invocation.
//!
//! Deliveries run in order, synchronously, with no `RefCell` borrow of the
//! container held, so a callback is free to read, mutate or (un)subscribe.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::detector::Notification;
use crate::event::ChangeEvent;
use crate::index::{ListenerRecord, PathIndex};
use crate::tree::StateTree;

/// One listener paired with the event it will receive. Listeners at the
/// same path share the event.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub record: ListenerRecord,
    pub event: Rc<ChangeEvent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    /// Unsubscribed after the batch was planned.
    pub skipped: usize,
    pub panicked: usize,
}

/// Turns notifications into deliveries once the mutation has committed.
///
/// `value` is re-read from the committed tree so a listener sees exactly
/// what a `get` at its path would return, references included.
pub fn plan(notifications: Vec<Notification>, tree: &StateTree) -> Vec<Delivery> {
    let mut deliveries = Vec::new();
    for notification in notifications {
        let event = Rc::new(ChangeEvent {
            path: notification.path.as_str().to_string(),
            value: tree.get(&notification.path).cloned(),
            old_value: notification.old_value,
        });
        deliveries.extend(notification.listeners.into_iter().map(|record| Delivery {
            record,
            event: Rc::clone(&event),
        }));
    }
    deliveries
}

pub struct Dispatcher<'a> {
    index: &'a RefCell<PathIndex>,
    catch_panics: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(index: &'a RefCell<PathIndex>, catch_panics: bool) -> Self {
        Self {
            index,
            catch_panics,
        }
    }

    pub fn dispatch(&self, deliveries: Vec<Delivery>) -> DispatchReport {
        let mut report = DispatchReport::default();
        for Delivery { record, event } in deliveries {
            let live = self.index.borrow().is_registered(&record.path, record.id);
            if !live {
                report.skipped += 1;
                continue;
            }
            log::trace!("delivering `{}` to listener {}", event.path, record.id);
            if !self.catch_panics {
                record.call(&event);
                report.delivered += 1;
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| record.call(&event))) {
                Ok(()) => report.delivered += 1,
                Err(payload) => {
                    report.panicked += 1;
                    log::error!(
                        "listener {} at `{}` panicked: {}",
                        record.id,
                        event.path,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
