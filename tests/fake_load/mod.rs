//! An in-process stand-in for the electronic load, speaking its UDP protocol
//! on loopback.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use tokio::{net::UdpSocket, task::JoinHandle};

#[allow(dead_code)]
pub enum Behaviour {
    /// Keep state like the real device: clamp set-points to their limits.
    Simulate,
    /// Answer every query with this text.
    Reply(&'static str),
    /// Never answer.
    Silent,
}

pub struct FakeLoad {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

#[allow(dead_code)]
impl FakeLoad {
    pub async fn spawn(behaviour: Behaviour) -> FakeLoad {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = received.clone();
        let task = tokio::spawn(async move {
            let mut device = Device::new();
            let mut buffer = [0u8; 1024];
            while let Ok((len, from)) = socket.recv_from(&mut buffer).await {
                let datagram = String::from_utf8_lossy(&buffer[..len]).into_owned();
                log.lock().unwrap().push(datagram.clone());

                let command = datagram.trim_end_matches('\n');
                let reply = match &behaviour {
                    Behaviour::Simulate => device.handle(command),
                    Behaviour::Reply(text) if command.ends_with('?') => Some(text.to_string()),
                    Behaviour::Reply(_) | Behaviour::Silent => None,
                };

                if let Some(reply) = reply {
                    let _ = socket.send_to(reply.as_bytes(), from).await;
                }
            }
        });

        FakeLoad {
            addr,
            received,
            task,
        }
    }

    /// Every datagram received so far, verbatim.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for FakeLoad {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Device {
    values: HashMap<String, f64>,
    input: bool,
}

impl Device {
    fn new() -> Device {
        let mut values = HashMap::new();
        for (family, upper) in [("VOLT", 150.0), ("CURR", 30.0), ("POW", 300.0), ("RES", 7500.0)]
        {
            values.insert(format!(":{family}"), 0.0);
            values.insert(format!(":{family}:LOW"), 0.0);
            values.insert(format!(":{family}:UPP"), upper);
        }
        Device {
            values,
            input: false,
        }
    }

    fn unit(mnemonic: &str) -> &'static str {
        match mnemonic.split(':').nth(1) {
            Some("VOLT") => "V",
            Some("CURR") => "A",
            Some("POW") => "W",
            _ => "OHM",
        }
    }

    fn handle(&mut self, command: &str) -> Option<String> {
        if let Some(query) = command.strip_suffix('?') {
            if query == ":INP" {
                return Some(if self.input { "ON\n" } else { "OFF\n" }.to_string());
            }
            if let Some(mnemonic) = query.strip_prefix(":MEAS") {
                let value = self.measure(mnemonic);
                return Some(format!("{value}{}\n", Self::unit(mnemonic)));
            }
            let value = self.values.get(query)?;
            return Some(format!("{value}{}\n", Self::unit(query)));
        }

        let (mnemonic, argument) = command.split_once(' ')?;
        if mnemonic == ":INP" {
            self.input = argument == "1";
            return None;
        }

        let number: f64 = argument
            .trim_end_matches(|c: char| c.is_ascii_alphabetic())
            .parse()
            .ok()?;
        if mnemonic.ends_with(":UPP") {
            self.values.insert(mnemonic.to_string(), number);
        } else {
            let lower = self.values[&format!("{mnemonic}:LOW")];
            let upper = self.values[&format!("{mnemonic}:UPP")];
            self.values
                .insert(mnemonic.to_string(), number.clamp(lower, upper));
        }
        None
    }

    /// A 12 V source with 0.5 Ohm internal resistance.
    fn measure(&self, mnemonic: &str) -> f64 {
        let current = if self.input { self.values[":CURR"] } else { 0.0 };
        let voltage = 12.0 - 0.5 * current;
        match mnemonic {
            ":VOLT" => voltage,
            ":CURR" => current,
            ":POW" => voltage * current,
            _ => self.values[":RES"],
        }
    }
}
