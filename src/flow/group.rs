//! Per-key grouping: group_by and GroupedFlow
//!
//! Each new key opens a per-key flow, emitted downstream exactly once;
//! subsequent values with that key are routed only into the existing per-key
//! flow. Per-key flows live in an arena keyed by the group key and share the
//! parent subscription's lifetime: they all complete (or fail) when the
//! parent terminates.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::error::{catch_fault, FlowError};
use crate::flow::core::{Flow, FlowEmitter};
use crate::subscriber::callbacks;

enum GroupSignal<T> {
    Value(T),
    Complete,
    Error(FlowError),
}

struct ChannelState<T> {
    // Signals that arrived before the group flow was subscribed.
    buffered: VecDeque<GroupSignal<T>>,
    emitter: Option<FlowEmitter<T>>,
}

/// Hot per-key channel bridging the parent subscription and one group flow.
struct GroupChannel<T> {
    state: Arc<Mutex<ChannelState<T>>>,
}

impl<T> Clone for GroupChannel<T> {
    fn clone(&self) -> Self {
        GroupChannel {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Send + 'static> GroupChannel<T> {
    fn new() -> Self {
        GroupChannel {
            state: Arc::new(Mutex::new(ChannelState {
                buffered: VecDeque::new(),
                emitter: None,
            })),
        }
    }

    /// The consumer-facing flow for this key. Intended for a single
    /// subscriber; subscribing drains anything buffered so far and then
    /// receives live signals.
    fn flow(&self) -> Flow<T> {
        let state = Arc::clone(&self.state);
        Flow::create(move |out| {
            let drained: Vec<GroupSignal<T>> = {
                let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
                let drained = st.buffered.drain(..).collect();
                st.emitter = Some(out.clone());
                drained
            };
            for signal in drained {
                match signal {
                    GroupSignal::Value(value) => out.emit(value),
                    GroupSignal::Complete => out.complete(),
                    GroupSignal::Error(error) => out.fail(error),
                }
            }
        })
    }

    fn push(&self, signal: GroupSignal<T>) {
        let emitter = {
            let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
            match st.emitter.clone() {
                Some(emitter) => Some(emitter),
                None => {
                    st.buffered.push_back(signal);
                    return;
                }
            }
        };
        if let Some(emitter) = emitter {
            match signal {
                GroupSignal::Value(value) => emitter.emit(value),
                GroupSignal::Complete => emitter.complete(),
                GroupSignal::Error(error) => emitter.fail(error),
            }
        }
    }
}

/// One group produced by [`Flow::group_by`]: the derived key plus the
/// per-key flow of values routed to it.
pub struct GroupedFlow<K, T> {
    key: K,
    flow: Flow<T>,
}

impl<K, T> GroupedFlow<K, T> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn flow(&self) -> &Flow<T> {
        &self.flow
    }

    pub fn into_parts(self) -> (K, Flow<T>) {
        (self.key, self.flow)
    }
}

impl<T: Send + 'static> Flow<T> {
    /// Partition values by derived key. For each new key, a
    /// [`GroupedFlow`] is emitted once; all groups terminate together with
    /// the parent.
    pub fn group_by<K, F>(&self, key_fn: F) -> Flow<GroupedFlow<K, T>>
    where
        K: Eq + Hash + Clone + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let key_fn = Arc::new(key_fn);
        Flow::create(move |out| {
            let key_fn = Arc::clone(&key_fn);
            let groups: Arc<Mutex<HashMap<K, GroupChannel<T>>>> =
                Arc::new(Mutex::new(HashMap::new()));

            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let groups = Arc::clone(&groups);
                        move |value| {
                            let key = match catch_fault(|| key_fn(&value)) {
                                Ok(key) => key,
                                Err(fault) => {
                                    fail_all_groups(&groups, &fault);
                                    out.fail(fault);
                                    return;
                                }
                            };
                            let (channel, opened) = {
                                let mut held = groups.lock().unwrap_or_else(|e| e.into_inner());
                                match held.get(&key) {
                                    Some(channel) => (channel.clone(), false),
                                    None => {
                                        let channel = GroupChannel::new();
                                        held.insert(key.clone(), channel.clone());
                                        (channel, true)
                                    }
                                }
                            };
                            if opened {
                                // Announce the group before routing its first
                                // value, so a subscriber attaching
                                // synchronously sees that value live rather
                                // than buffered.
                                out.emit(GroupedFlow {
                                    key,
                                    flow: channel.flow(),
                                });
                            }
                            channel.push(GroupSignal::Value(value));
                        }
                    },
                    {
                        let out = out.clone();
                        let groups = Arc::clone(&groups);
                        move || {
                            let channels: Vec<GroupChannel<T>> = {
                                let held = groups.lock().unwrap_or_else(|e| e.into_inner());
                                held.values().cloned().collect()
                            };
                            for channel in channels {
                                channel.push(GroupSignal::Complete);
                            }
                            out.complete();
                        }
                    },
                    {
                        let out = out.clone();
                        let groups = Arc::clone(&groups);
                        move |error| {
                            fail_all_groups(&groups, &error);
                            out.fail(error);
                        }
                    },
                ),
                out.subscription(),
            );
        })
    }
}

fn fail_all_groups<K, T>(groups: &Arc<Mutex<HashMap<K, GroupChannel<T>>>>, error: &FlowError)
where
    K: Eq + Hash,
    T: Send + 'static,
{
    let channels: Vec<GroupChannel<T>> = {
        let held = groups.lock().unwrap_or_else(|e| e.into_inner());
        held.values().cloned().collect()
    };
    for channel in channels {
        channel.push(GroupSignal::Error(error.clone()));
    }
}
