mod test_arbiter;
