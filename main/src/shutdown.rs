/*
 * Copyright 2024 Fluence Labs Limited
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use eyre::WrapErr as _;
use tokio::signal::unix::signal;
use tokio::signal::unix::Signal;
use tokio::signal::unix::SignalKind;

/// Handlers for every signal that should end `hold` with a deactivation.
/// Installing them replaces the default terminate action, so this has to happen
/// before the first register write.
pub(crate) struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
    quit: Signal,
}

impl ShutdownSignals {
    /// Must be called within a tokio runtime context.
    pub(crate) fn install() -> eyre::Result<Self> {
        Ok(Self {
            interrupt: install_one(SignalKind::interrupt(), "SIGINT")?,
            terminate: install_one(SignalKind::terminate(), "SIGTERM")?,
            hangup: install_one(SignalKind::hangup(), "SIGHUP")?,
            quit: install_one(SignalKind::quit(), "SIGQUIT")?,
        })
    }

    /// Resolves with the name of the first signal received.
    pub(crate) async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.hangup.recv() => "SIGHUP",
            _ = self.quit.recv() => "SIGQUIT",
        }
    }
}

fn install_one(kind: SignalKind, name: &str) -> eyre::Result<Signal> {
    signal(kind).wrap_err_with(|| format!("installing {name} handler failed"))
}
