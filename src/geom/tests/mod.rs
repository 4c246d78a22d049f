mod test_dispersion_basic;
