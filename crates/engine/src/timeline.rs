//! Lifetime history of one equipment unit.
//!
//! Three streams (events, maintenance spans, linked service orders) are merged
//! newest first. Each maintenance contributes an `opened` entry and, once
//! closed, a `closed` entry. Entries sharing a timestamp are ordered by
//! insertion key, newest first; ids are UUIDv7 so id order is insertion order.

use std::{cmp::Ordering, collections::BinaryHeap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{Equipment, EquipmentEvent, MaintenanceRecord, ServiceOrder};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "data", rename_all = "snake_case")]
pub enum TimelineItem {
    Event(EquipmentEvent),
    MaintenanceOpened(MaintenanceRecord),
    MaintenanceClosed(MaintenanceRecord),
    ServiceOrder(ServiceOrder),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub item: TimelineItem,
}

impl TimelineEntry {
    fn sort_key(&self) -> (DateTime<Utc>, Uuid, u8) {
        match &self.item {
            TimelineItem::Event(event) => (self.at, event.id, 0),
            TimelineItem::MaintenanceOpened(record) => (self.at, record.id, 0),
            TimelineItem::MaintenanceClosed(record) => (self.at, record.id, 1),
            TimelineItem::ServiceOrder(order) => (self.at, order.id, 0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LifetimeHistory {
    pub equipment: Equipment,
    pub timeline: Vec<TimelineEntry>,
    pub total_service_orders: usize,
    pub total_maintenances: usize,
    pub total_events: usize,
}

impl LifetimeHistory {
    pub fn build(
        equipment: Equipment,
        events: Vec<EquipmentEvent>,
        maintenances: Vec<MaintenanceRecord>,
        service_orders: Vec<ServiceOrder>,
    ) -> Self {
        let total_events = events.len();
        let total_maintenances = maintenances.len();
        let total_service_orders = service_orders.len();

        let events = events
            .into_iter()
            .map(|event| TimelineEntry {
                at: event.at,
                item: TimelineItem::Event(event),
            })
            .collect();

        let spans = maintenances
            .into_iter()
            .flat_map(|record| {
                let closed = record.closed_at.map(|at| TimelineEntry {
                    at,
                    item: TimelineItem::MaintenanceClosed(record.clone()),
                });
                let opened = TimelineEntry {
                    at: record.opened_at,
                    item: TimelineItem::MaintenanceOpened(record),
                };
                std::iter::once(opened).chain(closed)
            })
            .collect();

        let orders = service_orders
            .into_iter()
            .map(|order| TimelineEntry {
                at: order.opened_at,
                item: TimelineItem::ServiceOrder(order),
            })
            .collect();

        Self {
            equipment,
            timeline: merge_desc(vec![events, spans, orders]),
            total_service_orders,
            total_maintenances,
            total_events,
        }
    }
}

struct Head {
    entry: TimelineEntry,
    stream: usize,
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        self.entry
            .sort_key()
            .cmp(&other.entry.sort_key())
            .then_with(|| other.stream.cmp(&self.stream))
    }
}

/// k-way merge, newest first.
fn merge_desc(streams: Vec<Vec<TimelineEntry>>) -> Vec<TimelineEntry> {
    let total = streams.iter().map(Vec::len).sum();
    let mut iters: Vec<_> = streams
        .into_iter()
        .map(|mut stream| {
            stream.sort_by_key(|entry| std::cmp::Reverse(entry.sort_key()));
            stream.into_iter()
        })
        .collect();

    let mut heap = BinaryHeap::with_capacity(iters.len());
    for (stream, iter) in iters.iter_mut().enumerate() {
        if let Some(entry) = iter.next() {
            heap.push(Head { entry, stream });
        }
    }

    let mut out = Vec::with_capacity(total);
    while let Some(Head { entry, stream }) = heap.pop() {
        out.push(entry);
        if let Some(next) = iters[stream].next() {
            heap.push(Head {
                entry: next,
                stream,
            });
        }
    }
    out
}
