use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderDeadLetteredEvent,
    OrderInvalidatedEvent,
    OrderProcessedEvent,
};

/// The publishing side of the registered hooks. Cheap to clone; hand one to every component that emits events.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_processed_producer: Vec<EventProducer<OrderProcessedEvent>>,
    pub order_invalidated_producer: Vec<EventProducer<OrderInvalidatedEvent>>,
    pub order_dead_lettered_producer: Vec<EventProducer<OrderDeadLetteredEvent>>,
}

impl EventProducers {
    pub async fn publish_order_processed(&self, event: OrderProcessedEvent) {
        for emitter in &self.order_processed_producer {
            trace!("📬️ Notifying order processed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_invalidated(&self, event: OrderInvalidatedEvent) {
        for emitter in &self.order_invalidated_producer {
            trace!("📬️ Notifying order invalidated hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_dead_lettered(&self, event: OrderDeadLetteredEvent) {
        for emitter in &self.order_dead_lettered_producer {
            trace!("📬️ Notifying dead letter hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_processed: Option<EventHandler<OrderProcessedEvent>>,
    pub on_order_invalidated: Option<EventHandler<OrderInvalidatedEvent>>,
    pub on_order_dead_lettered: Option<EventHandler<OrderDeadLetteredEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_processed = hooks.on_order_processed.map(|f| EventHandler::new(buffer_size, f));
        let on_order_invalidated = hooks.on_order_invalidated.map(|f| EventHandler::new(buffer_size, f));
        let on_order_dead_lettered = hooks.on_order_dead_lettered.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_processed, on_order_invalidated, on_order_dead_lettered }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_processed {
            result.order_processed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_invalidated {
            result.order_invalidated_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_dead_lettered {
            result.order_dead_lettered_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task for every registered handler. Each task ends once all producers for it have been dropped.
    pub fn start_handlers(self) -> Vec<tokio::task::JoinHandle<()>> {
        let mut tasks = Vec::with_capacity(3);
        if let Some(handler) = self.on_order_processed {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_order_invalidated {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_order_dead_lettered {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        tasks
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_processed: Option<Handler<OrderProcessedEvent>>,
    pub on_order_invalidated: Option<Handler<OrderInvalidatedEvent>>,
    pub on_order_dead_lettered: Option<Handler<OrderDeadLetteredEvent>>,
}

impl EventHooks {
    pub fn on_order_processed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderProcessedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_processed = Some(Arc::new(f));
        self
    }

    pub fn on_order_invalidated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderInvalidatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_invalidated = Some(Arc::new(f));
        self
    }

    /// The dead letter sink. Called for every order the reconciliation worker gives up on.
    pub fn on_order_dead_lettered<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderDeadLetteredEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_dead_lettered = Some(Arc::new(f));
        self
    }
}
