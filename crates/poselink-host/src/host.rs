use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use poselink_catalog::{Catalog, DeviceSerial, SharedCatalog};
use poselink_frame::{Frame, FrameError, FrameReader, FrameWriter, TERMINATOR_LEN};
use poselink_proto::{
    ControlMessage, ProtoError, Status, TrackingSignal, CONTROL_PAYLOAD_SIZE,
};
use poselink_transport::{
    connect_channel, connect_channel_timeout, ChannelRole, PoseStream,
};
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::error::Result;
use crate::events::{DeviceHost, ParamChange};
use crate::mux;
use crate::receiver::{spawn_channel_receiver, ResizeHandle};
use crate::registry::DeviceRegistry;
use crate::scheduler::Scheduler;

/// The consumer endpoint: connects both channels to a producer, keeps the
/// device catalogue in sync with it, and feeds per-device frame slices to
/// the `DeviceHost` collaborator.
///
/// All protocol work happens on background threads (two receivers plus the
/// scheduler); the owning thread only ever sees callbacks. Dropping the
/// host shuts it down.
pub struct TrackingHost {
    shared: Arc<HostShared>,
    scheduler: Scheduler,
    tracking_thread: Option<JoinHandle<()>>,
    manager_thread: Option<JoinHandle<()>>,
    tracking_ctl: PoseStream,
    manager_ctl: PoseStream,
    closed: bool,
}

struct HostShared {
    catalog: SharedCatalog,
    registry: Mutex<DeviceRegistry>,
    events: Mutex<Box<dyn DeviceHost>>,
    /// Raised while a staged catalogue waits to be applied; tracking
    /// dispatch is suspended for the duration.
    sync_in_progress: AtomicBool,
    staged: Mutex<Option<Vec<poselink_catalog::DeviceKind>>>,
    tracking_tx: Mutex<FrameWriter<PoseStream>>,
    manager_tx: Mutex<FrameWriter<PoseStream>>,
    tracking_resize: ResizeHandle,
    closing: AtomicBool,
}

impl TrackingHost {
    /// Connect both channels and start the host runtime.
    pub fn connect(config: &HostConfig, events: Box<dyn DeviceHost>) -> Result<Self> {
        let addr = config.socket_addr()?;
        let initial = Catalog::parse(&config.catalog)?;

        let dial = |role| match config.connect_timeout() {
            Some(timeout) => connect_channel_timeout(addr, role, timeout),
            None => connect_channel(addr, role),
        };
        let tracking = dial(ChannelRole::Tracking)?;
        let manager = dial(ChannelRole::Manager)?;

        let tracking_rx = tracking.try_clone()?;
        let manager_rx = manager.try_clone()?;
        let tracking_ctl = tracking.try_clone()?;
        let manager_ctl = manager.try_clone()?;

        let shared = Arc::new(HostShared {
            catalog: SharedCatalog::new(initial.clone()),
            registry: Mutex::new(DeviceRegistry::new()),
            events: Mutex::new(events),
            sync_in_progress: AtomicBool::new(false),
            staged: Mutex::new(None),
            tracking_tx: Mutex::new(FrameWriter::new(tracking)),
            manager_tx: Mutex::new(FrameWriter::new(manager)),
            tracking_resize: ResizeHandle::new(),
            closing: AtomicBool::new(false),
        });

        // Announce the initial catalogue before any frame can arrive.
        {
            let mut events = shared.lock_events();
            shared.lock_registry().sync(&initial, events.as_mut());
        }

        let tracking_reader =
            FrameReader::with_expected_frame_size(tracking_rx, initial.frame_size());
        let manager_reader = FrameReader::with_expected_frame_size(
            manager_rx,
            CONTROL_PAYLOAD_SIZE + TERMINATOR_LEN,
        );

        let tracking_thread = spawn_channel_receiver(
            "tracking",
            tracking_reader,
            shared.tracking_resize.clone(),
            {
                let shared = Arc::clone(&shared);
                move |frame| shared.handle_tracking_frame(frame)
            },
            {
                let shared = Arc::clone(&shared);
                move |err| shared.channel_lost(ChannelRole::Tracking, err)
            },
        )?;

        let manager_thread = spawn_channel_receiver(
            "manager",
            manager_reader,
            ResizeHandle::new(),
            {
                let shared = Arc::clone(&shared);
                move |frame| shared.handle_control_frame(frame)
            },
            {
                let shared = Arc::clone(&shared);
                move |err| shared.channel_lost(ChannelRole::Manager, err)
            },
        )?;

        let scheduler = Scheduler::new()?;
        scheduler.register(config.fast_tick(), {
            let shared = Arc::clone(&shared);
            move || shared.apply_staged_catalog()
        });
        scheduler.register(config.maintenance_tick(), {
            let shared = Arc::clone(&shared);
            move || shared.maintenance_tick()
        });

        info!(%addr, catalog = %initial, "tracking host connected");

        Ok(Self {
            shared,
            scheduler,
            tracking_thread: Some(tracking_thread),
            manager_thread: Some(manager_thread),
            tracking_ctl,
            manager_ctl,
            closed: false,
        })
    }

    /// Snapshot of the active catalogue.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.shared.catalog.load()
    }

    /// Serials currently receiving frames, in catalogue order.
    pub fn active_devices(&self) -> Vec<DeviceSerial> {
        self.shared.lock_registry().active().to_vec()
    }

    /// Whether a catalogue replacement is currently staged or applying.
    pub fn is_syncing(&self) -> bool {
        self.shared.sync_in_progress.load(Ordering::Acquire)
    }

    /// Tell the producer to stop, close both channels, and join the
    /// background threads. Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.shared.closing.store(true, Ordering::Release);
        info!("tracking host shutting down");

        if let Err(err) = self
            .shared
            .lock_tracking_tx()
            .send(&TrackingSignal::Shutdown.encode())
        {
            debug!(error = %err, "could not send shutdown signal");
        }

        self.scheduler.stop();
        let _ = self.tracking_ctl.shutdown();
        let _ = self.manager_ctl.shutdown();

        for thread in [self.tracking_thread.take(), self.manager_thread.take()]
            .into_iter()
            .flatten()
        {
            let _ = thread.join();
        }
    }
}

impl Drop for TrackingHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl HostShared {
    fn handle_tracking_frame(&self, frame: Frame) {
        if self.sync_in_progress.load(Ordering::Acquire) {
            debug!("dropping tracking frame during catalogue sync");
            return;
        }

        let catalog = self.catalog.load();
        let mut events = self.lock_events();
        if let Err(mismatch) = mux::dispatch(&frame, &catalog, events.as_mut()) {
            drop(events);
            debug!(
                got = mismatch.got,
                expected = mismatch.expected_size,
                generation = mismatch.generation,
                "rejecting frame with stale shape"
            );
            let signal = TrackingSignal::BadFrame {
                expected_size: mismatch.expected_size as u32,
                generation: mismatch.generation,
            };
            if let Err(err) = self.lock_tracking_tx().send(&signal.encode()) {
                warn!(error = %err, "could not send bad-frame signal");
            }
        }
    }

    fn handle_control_frame(&self, frame: Frame) {
        let payload = frame.payload();
        if payload.len() != CONTROL_PAYLOAD_SIZE {
            debug!(
                len = payload.len(),
                "dropping control frame of unexpected size"
            );
            return;
        }

        match ControlMessage::decode(payload) {
            Ok(ControlMessage::ReplaceCatalog(kinds)) => {
                if self.sync_in_progress.swap(true, Ordering::AcqRel) {
                    warn!("catalogue replace received while another is in progress");
                    self.send_status(Status::FailedToProcess);
                    return;
                }
                debug!(count = kinds.len(), "catalogue replace staged");
                *self.lock_staged() = Some(kinds);
                // The Ok response follows once the fast tick applies it.
            }
            Ok(msg) => {
                if let Some(change) = param_change(&msg) {
                    debug!(?change, "parameter change applied");
                    self.lock_events().parameter_changed(change);
                    self.send_status(Status::Ok);
                }
            }
            Err(ProtoError::UnknownType(type_code)) => {
                debug!(type_code, "unrecognized control message");
                self.send_status(Status::Invalid);
            }
            Err(err) => {
                debug!(error = %err, "rejecting malformed control message");
                self.send_status(Status::Failed);
            }
        }
    }

    /// Fast-tick body: apply a staged catalogue replacement.
    ///
    /// Runs the whole replace sequence — registry diff, receiver resize,
    /// snapshot swap — before lowering the sync flag and acknowledging, so
    /// dispatch never sees a half-applied catalogue.
    fn apply_staged_catalog(&self) {
        if !self.sync_in_progress.load(Ordering::Acquire) {
            return;
        }
        let Some(kinds) = self.lock_staged().take() else {
            return;
        };

        let next = self.catalog.load().advance(kinds);
        let frame_size = next.frame_size();
        let generation = next.generation();

        {
            let mut events = self.lock_events();
            self.lock_registry().sync(&next, events.as_mut());
        }

        self.tracking_resize.request(frame_size);
        self.catalog.store(next);
        self.sync_in_progress.store(false, Ordering::Release);

        info!(generation, frame_size, "catalogue replaced");
        self.send_status(Status::Ok);
    }

    /// Maintenance-tick body: per-device upkeep plus the host heartbeat.
    fn maintenance_tick(&self) {
        let active = self.lock_registry().active().to_vec();
        let mut events = self.lock_events();
        for serial in active {
            events.maintenance(serial);
        }
        events.heartbeat();
    }

    fn channel_lost(&self, role: ChannelRole, err: FrameError) {
        if self.closing.load(Ordering::Acquire) {
            return;
        }
        self.lock_events().channel_lost(role, &err.to_string());
    }

    fn send_status(&self, status: Status) {
        if let Err(err) = self.lock_manager_tx().send(&status.encode()) {
            warn!(error = %err, %status, "could not send status response");
        }
    }

    fn lock_events(&self) -> MutexGuard<'_, Box<dyn DeviceHost>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_registry(&self) -> MutexGuard<'_, DeviceRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_staged(&self) -> MutexGuard<'_, Option<Vec<poselink_catalog::DeviceKind>>> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tracking_tx(&self) -> MutexGuard<'_, FrameWriter<PoseStream>> {
        self.tracking_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_manager_tx(&self) -> MutexGuard<'_, FrameWriter<PoseStream>> {
        self.manager_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn param_change(msg: &ControlMessage) -> Option<ParamChange> {
    match *msg {
        ControlMessage::SetIpd(v) => Some(ParamChange::Ipd(v)),
        ControlMessage::SetPoseTimeOffset(v) => Some(ParamChange::PoseTimeOffset(v)),
        ControlMessage::SetDistortion {
            k1,
            k2,
            zoom_width,
            zoom_height,
        } => Some(ParamChange::Distortion {
            k1,
            k2,
            zoom_width,
            zoom_height,
        }),
        ControlMessage::SetEyeGap(v) => Some(ParamChange::EyeGap(v)),
        ControlMessage::SetSelfPose(pos) => Some(ParamChange::SelfPose(pos)),
        ControlMessage::ReplaceCatalog(_) => None,
    }
}
