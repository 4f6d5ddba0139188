mod buffer;
mod manager;
mod registry;
