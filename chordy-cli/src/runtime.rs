//! Single-threaded run loop: MIDI in, session, MIDI out.

use std::io::{BufRead, BufReader};
use std::thread::JoinHandle;

use chordy_core::config::Config;
use chordy_core::midi::{MidiError, MidiInputManager, MidiOutputManager};
use chordy_core::session::Session;
use chordy_core::surface::input_from_midi;
use chordy_types::NoteEvent;
use crossbeam_channel::{select, Sender};

/// True when `reader` asks to stop: a `q` or `quit` line, or end of input
/// after at least one line. Input that is already closed never stops the loop.
fn wants_quit<R: BufRead>(reader: R) -> bool {
    let mut read_any = false;
    for line in reader.lines() {
        match line {
            Ok(line) if matches!(line.trim(), "q" | "quit") => return true,
            Ok(_) => read_any = true,
            Err(e) => {
                log::warn!("stdin unreadable, stop with Ctrl-C: {}", e);
                return false;
            }
        }
    }
    read_any
}

fn watch_input<R: BufRead + Send + 'static>(reader: R, quit: Sender<()>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        if wants_quit(reader) {
            let _ = quit.try_send(());
        }
    })
}

/// Ctrl-C and stdin both signal on `quit`. The caller keeps `quit` alive so
/// the channel never reads as disconnected.
fn install_quit_triggers(quit: &Sender<()>) {
    let interrupt = quit.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = interrupt.try_send(());
    }) {
        log::warn!("Ctrl-C handler not installed: {}", e);
    }
    watch_input(BufReader::new(std::io::stdin()), quit.clone());
}

fn flush(output: &mut MidiOutputManager, pending: &mut Vec<NoteEvent>) {
    for event in pending.drain(..) {
        if let Err(e) = output.send(&event) {
            log::warn!(target: "midi", "{}", e);
        }
    }
}

pub fn run(config: &Config) -> Result<(), MidiError> {
    let client = config.client_name();

    let mut output = MidiOutputManager::new(&client);
    let output_ports = config.output_ports();
    if output.connect_matching(&output_ports)? == 0 {
        return Err(MidiError::PortNotFound(format!("{:?}", output_ports)));
    }

    let mut input = MidiInputManager::new(&client);
    let input_ports = config.input_ports();
    if input.connect_matching(&input_ports)? == 0 {
        log::warn!(target: "midi", "no input port matching {:?}; only quit will do anything", input_ports);
    }

    let mut session = Session::from_config(config);
    let (quit_tx, quit) = crossbeam_channel::bounded(1);
    install_quit_triggers(&quit_tx);
    let mut pending = Vec::new();
    log::info!(
        "listening on {:?}; Ctrl-C or q and Enter to stop",
        input.connected_port_names()
    );

    loop {
        select! {
            recv(input.receiver()) -> event => {
                let Ok(event) = event else { break };
                log::trace!(target: "midi", "{} us {:?}", event.timestamp_us, event.kind);
                session.handle(input_from_midi(&event.kind), &mut pending);
                flush(&mut output, &mut pending);
            }
            recv(quit) -> _ => break,
        }
    }

    session.shutdown(&mut pending);
    log::info!("stopping; releasing {} notes", pending.len());
    flush(&mut output, &mut pending);
    input.disconnect_all();
    output.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines(text: &str) -> Cursor<Vec<u8>> {
        Cursor::new(text.as_bytes().to_vec())
    }

    #[test]
    fn test_quit_commands() {
        assert!(wants_quit(lines("q\n")));
        assert!(wants_quit(lines("  quit \n")));
        assert!(wants_quit(lines("status\nq\nignored\n")));
    }

    #[test]
    fn test_closed_input_after_a_line_quits() {
        assert!(wants_quit(lines("hello\n")));
        assert!(wants_quit(lines("\n")));
    }

    #[test]
    fn test_input_closed_at_startup_does_not_quit() {
        assert!(!wants_quit(lines("")));
    }

    #[test]
    fn test_watch_input_signals_only_on_quit() {
        let (tx, rx) = crossbeam_channel::bounded(1);

        watch_input(lines(""), tx.clone()).join().unwrap();
        assert!(rx.try_recv().is_err());

        watch_input(lines("q\n"), tx.clone()).join().unwrap();
        assert_eq!(rx.try_recv(), Ok(()));
    }

    #[test]
    fn test_repeated_signals_do_not_block() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        watch_input(lines("q\n"), tx.clone()).join().unwrap();
        watch_input(lines("quit\n"), tx.clone()).join().unwrap();
        assert_eq!(rx.try_recv(), Ok(()));
        assert!(rx.try_recv().is_err());
    }
}
