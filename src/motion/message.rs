use bevy_ecs::prelude::*;

/// The kind of notification carried by a [MotionMessage].
///
/// The numeric ids are part of the message contract other systems match on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
#[repr(u32)]
pub enum MessageKind {
    Activate = 1100,
    Deactivate = 1101,
    AnimatorChanged = 1102,
}

impl MessageKind {
    #[inline]
    pub const fn id(self) -> u32 {
        self as u32
    }
}

/// Identifies a motion inside a controller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MotionRef {
    pub layer: usize,
    pub index: usize,
    pub name: String,
}

/// Sent whenever a motion starts or stops, or an animator layer changes state.
#[derive(Clone, Debug, Message, PartialEq)]
pub struct MotionMessage {
    pub kind: MessageKind,
    /// The motion involved. For [MessageKind::AnimatorChanged] this is the active motion of
    /// the layer, if any.
    pub motion: Option<MotionRef>,
    /// Index of the controller layer the message is about.
    pub layer: usize,
    /// New animator state id for [MessageKind::AnimatorChanged], `0` otherwise.
    pub state_id: i32,
    /// The entity owning the controller, filled in when the message is forwarded by the ECS.
    pub entity: Option<Entity>,
    /// Set by a listener that took care of the message. A handled activation skips the
    /// motion's default phase write.
    pub is_handled: bool,
}

impl MotionMessage {
    pub fn new(kind: MessageKind, layer: usize, motion: Option<MotionRef>) -> Self {
        Self {
            kind,
            motion,
            layer,
            state_id: 0,
            entity: None,
            is_handled: false,
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.kind.id()
    }
}

/// Receives motion messages from a controller.
pub trait MotionListener: Send + Sync {
    fn on_message(&mut self, message: &mut MotionMessage);
}

impl<F> MotionListener for F
where
    F: FnMut(&mut MotionMessage) + Send + Sync,
{
    fn on_message(&mut self, message: &mut MotionMessage) {
        self(message)
    }
}

/// Ordered listeners plus an outbox of everything that was dispatched.
///
/// Listeners see each message in registration order and every listener sees every message,
/// even after one of them marked it handled. The outbox only keeps what was dispatched since
/// the controller's last update started; the ECS forwarding system drains it every frame.
#[derive(Default)]
pub struct MotionListeners {
    listeners: Vec<Box<dyn MotionListener>>,
    outbox: Vec<MotionMessage>,
}

impl MotionListeners {
    pub fn add(&mut self, listener: impl MotionListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `message` and return whether any listener handled it.
    pub fn dispatch(&mut self, mut message: MotionMessage) -> bool {
        for listener in self.listeners.iter_mut() {
            listener.on_message(&mut message);
        }

        let handled = message.is_handled;
        self.outbox.push(message);
        handled
    }

    /// Take every message dispatched since the last drain.
    pub fn drain(&mut self) -> impl Iterator<Item = MotionMessage> + '_ {
        self.outbox.drain(..)
    }

    #[inline]
    pub fn pending(&self) -> &[MotionMessage] {
        &self.outbox
    }

    /// Forget undrained messages. Listeners already saw them.
    pub fn clear_outbox(&mut self) {
        self.outbox.clear();
    }
}

impl std::fmt::Debug for MotionListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionListeners")
            .field("listeners", &self.listeners.len())
            .field("outbox", &self.outbox)
            .finish()
    }
}
