//! Notification dispatcher.
//!
//! Every HID Report notification arrives here tagged with the report ID
//! resolved when its characteristic was subscribed.  The payload goes
//! through the report parser into the session's [`ReportState`]; mouse
//! motion is then folded into the [`MouseMotion`] accumulator.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::error::ParserError;
use crate::hid::mapping::FieldMapping;
use crate::hid::parser::ReportParser;
use crate::hid::state::{MouseMotion, ReportState};
use crate::hid::{DeviceKind, DeviceTypes};

/// Receiver of tagged report notifications.
pub trait ReportSink {
    fn on_report(&self, payload: &[u8], report_id: u8);
}

/// Per-characteristic notification callback: a sink plus the report ID
/// the characteristic carries.
#[derive(Clone, Copy)]
pub struct NotifyHandler {
    report_id: u8,
    sink: &'static dyn ReportSink,
}

impl NotifyHandler {
    pub fn new(report_id: u8, sink: &'static dyn ReportSink) -> Self {
        Self { report_id, sink }
    }

    pub fn report_id(&self) -> u8 {
        self.report_id
    }

    /// Deliver one notification payload.
    pub fn handle(&self, payload: &[u8]) {
        self.sink.on_report(payload, self.report_id);
    }
}

struct Pipeline<P> {
    parser: P,
    state: ReportState,
}

/// Parser plus decoded state, shared between the radio context and the
/// consumer.
pub struct NotificationDispatcher<P> {
    pipeline: Mutex<CriticalSectionRawMutex, RefCell<Pipeline<P>>>,
    motion: MouseMotion,
}

impl<P: ReportParser> NotificationDispatcher<P> {
    pub const fn new(parser: P) -> Self {
        Self {
            pipeline: Mutex::new(RefCell::new(Pipeline {
                parser,
                state: ReportState::new(),
            })),
            motion: MouseMotion::new(),
        }
    }

    /// Ask the parser what the report map describes.
    pub fn classify(&self, descriptor: &[u8]) -> DeviceTypes {
        self.pipeline
            .lock(|p| p.borrow().parser.classify(descriptor))
    }

    /// Initialize the parser for `mapping`. On success the session
    /// becomes that device kind and the number of report-ID mappings is
    /// returned; on failure it stays unclassified.
    pub fn configure(&self, mapping: FieldMapping, descriptor: &[u8]) -> Result<usize, ParserError> {
        let result = self.pipeline.lock(|p| {
            let mut p = p.borrow_mut();
            let Pipeline { parser, state } = &mut *p;
            match parser.init(&mapping, descriptor) {
                Ok(()) => {
                    state.reset(DeviceKind::from(mapping));
                    Ok(parser.num_mappings())
                }
                Err(e) => {
                    state.reset(DeviceKind::Unclassified);
                    Err(e)
                }
            }
        });
        self.motion.reset();
        result
    }

    /// Forget the previous session's classification and input.
    pub fn clear(&self) {
        self.pipeline
            .lock(|p| p.borrow_mut().state.reset(DeviceKind::Unclassified));
        self.motion.reset();
    }

    /// Feed one notification through the parser.
    ///
    /// A failed parse leaves the session running; its motion is not
    /// accumulated.
    pub fn notify(&self, payload: &[u8], report_id: u8) -> Result<(), ParserError> {
        let decoded = self.pipeline.lock(|p| {
            let mut p = p.borrow_mut();
            let Pipeline { parser, state } = &mut *p;
            state.begin_report();
            parser
                .parse(payload, report_id, state.fields_mut())
                .map(|()| state.mouse_motion())
        });

        match decoded {
            Ok(Some((dx, dy))) => {
                self.motion.accumulate(dx, dy);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                debug!(
                    "HID report id {} ({} bytes) failed to parse: {}",
                    report_id,
                    payload.len(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Run `f` against the decoded state.
    pub fn with_state<R>(&self, f: impl FnOnce(&ReportState) -> R) -> R {
        self.pipeline.lock(|p| f(&p.borrow().state))
    }

    pub fn kind(&self) -> DeviceKind {
        self.with_state(|s| s.kind())
    }

    pub fn motion(&self) -> &MouseMotion {
        &self.motion
    }
}

impl<P: ReportParser> ReportSink for NotificationDispatcher<P> {
    fn on_report(&self, payload: &[u8], report_id: u8) {
        trace!("HID report id {} ({} bytes)", report_id, payload.len());
        let _ = self.notify(payload, report_id);
    }
}
