mod delivery;
mod exclusivity;
mod lifecycle;
