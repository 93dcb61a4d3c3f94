/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`    - Interactive simulator
- `send`    - Send a single message and print the reply
- `history` - Print the stored conversation for a contact

The handlers construct the history store and reply clients from
configuration and drive the simulator with them.
*/

// Special commands parser for the interactive prompt
pub mod special_commands;

// Interactive simulator handler
pub mod chat;

// One-shot send handler
pub mod send;

// Stored history viewer
pub mod history;
