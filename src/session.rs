// SPDX-FileCopyrightText: 2024 Alexandru Fikl <alexfikl@gmail.com>
// SPDX-License-Identifier: MIT

//! Interactive exploration with one render pass in flight at a time.
//!
//! Every pass renders on its own worker thread into a [`Frame`] it owns, and
//! hands the finished frame back over a channel tagged with its pass id. A new
//! pass is only started once the previous worker has finished, and frames
//! from passes that were superseded before being collected are dropped.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::render::{render_frame, Engine, Frame};
use crate::viewport::Viewport;

struct Pass {
    id: u64,
    frame: Result<Frame>,
}

pub struct Session {
    width: usize,
    height: usize,
    engine: Engine,
    viewport: Viewport,

    /// Id of the most recently requested pass (0 if none was requested).
    pass_id: u64,
    /// Id of the last pass whose frame was returned to the caller.
    delivered_id: u64,
    worker: Option<JoinHandle<()>>,
    sender: Sender<Pass>,
    receiver: Receiver<Pass>,
}

impl Session {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        let (sender, receiver) = channel();

        Ok(Session {
            width: config.width,
            height: config.height,
            engine: config.engine()?,
            viewport: config.viewport,
            pass_id: 0,
            delivered_id: 0,
            worker: None,
            sender,
            receiver,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Zoom towards the clicked pixel and request a new pass.
    pub fn click(&mut self, x: i64, y: i64) -> Result<u64> {
        self.viewport = self.viewport.zoom(self.width, self.height, x, y);
        log::info!("Zoomed around ({}, {}) to {:?}", x, y, self.viewport);

        self.request_render()
    }

    /// Start rendering the current viewport and return the new pass id.
    ///
    /// If a previous pass is still running, this waits for it to finish first.
    pub fn request_render(&mut self) -> Result<u64> {
        self.join_worker()?;

        self.pass_id += 1;
        let id = self.pass_id;
        let engine = self.engine;
        let viewport = self.viewport;
        let (width, height) = (self.width, self.height);
        let sender = self.sender.clone();

        log::info!("Starting pass {} on {:?}", id, viewport);
        self.worker = Some(std::thread::spawn(move || {
            let now = Instant::now();
            let frame = render_frame(&engine, &viewport, width, height);
            log::info!(
                "Finished pass {} in {:.3}s",
                id,
                now.elapsed().as_secs_f32()
            );

            // NOTE: the session may have been dropped in the meantime
            let _ = sender.send(Pass { id, frame });
        }));

        Ok(id)
    }

    /// Block until the most recently requested pass is done and return its frame.
    pub fn wait(&mut self) -> Result<Frame> {
        if self.delivered_id == self.pass_id {
            return Err(Error::NoPendingRender);
        }

        self.join_worker()?;
        self.collect().unwrap_or(Err(Error::WorkerPanicked))
    }

    /// Return the frame of the most recently requested pass if it is done.
    pub fn try_latest(&mut self) -> Option<Result<Frame>> {
        if self.delivered_id == self.pass_id {
            return None;
        }

        let finished = self.worker.as_ref().map_or(true, |w| w.is_finished());
        if !finished {
            return None;
        }

        if let Err(err) = self.join_worker() {
            return Some(Err(err));
        }

        self.collect()
    }

    fn join_worker(&mut self) -> Result<()> {
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| {
                log::warn!("Render worker for pass {} panicked", self.pass_id);
                Error::WorkerPanicked
            }),
            None => Ok(()),
        }
    }

    /// Drain finished passes, keeping only the latest one.
    fn collect(&mut self) -> Option<Result<Frame>> {
        let mut latest = None;
        for pass in self.receiver.try_iter() {
            if pass.id == self.pass_id {
                latest = Some(pass.frame);
            } else {
                log::warn!("Discarding stale pass {}", pass.id);
            }
        }

        if latest.is_some() {
            self.delivered_id = self.pass_id;
        }

        latest
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.join_worker();
    }
}

// {{{ tests


// }}}
