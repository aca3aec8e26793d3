mod test_reach_target;
mod test_avoid_obstacle;

#[cfg(feature = "allow_filesystem")]
mod test_from_yaml;
