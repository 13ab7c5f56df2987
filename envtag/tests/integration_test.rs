//! Integration tests

use envtag::{
    anyhow, unmarshal_as_value, Duration, EnvMarshaler, EnvReader, EnvUnmarshaler, Error,
    FileFallback, FromEnvStr, Kind, MapEnv, ParseError, Unmarshal, Value,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Debug, Default, Clone, PartialEq, Unmarshal)]
struct Obj1 {
    #[env("OBJ1_A")]
    a: String,
    #[env("OBJ1_B")]
    b: u64,
    #[env("OBJ1_C")]
    c: bool,
    #[env("OBJ1_D")]
    d: Vec<i32>,
    #[env("OBJ1_E")]
    e: Duration,
}

#[derive(Debug, Default, PartialEq, Unmarshal)]
struct Obj2 {
    #[env("OBJ2_A")]
    a: Box<String>,
    b: u32,
}

#[derive(Debug, Default, PartialEq, Unmarshal)]
struct NestedObj1 {
    #[env("NESTED_")]
    a: Obj1,
    #[env("NESTED_OBJ1_F")]
    f: u32,
}

#[derive(Debug, Default, PartialEq, Unmarshal)]
struct NestedObj2 {
    #[env("NESTED_OBJ2_")]
    a: Box<Obj1>,
    #[env("NESTED_OBJ2_B")]
    b: Vec<u32>,
    #[env(name = "NESTED_OBJ2_C")]
    c: Box<Vec<u32>>,
}

fn load<T: Unmarshal + Default>(vars: &[(&str, &str)]) -> Result<T, Error> {
    EnvMarshaler::new(vars.iter().copied().collect::<MapEnv>()).load()
}

fn obj1_env(prefix: &str) -> Vec<(String, String)> {
    [
        ("OBJ1_A", "hello"),
        ("OBJ1_B", "14"),
        ("OBJ1_C", "true"),
        ("OBJ1_D", "1, -2, 100, 3"),
        ("OBJ1_E", "12m"),
    ]
    .into_iter()
    .map(|(key, value)| (format!("{prefix}{key}"), value.to_string()))
    .collect()
}

fn expected_obj1() -> Obj1 {
    Obj1 {
        a: "hello".to_string(),
        b: 14,
        c: true,
        d: vec![1, -2, 100, 3],
        e: Duration::MINUTE * 12,
    }
}

#[test]
fn test_obj1() {
    let obj: Obj1 = load(&[
        ("OBJ1_A", "hello"),
        ("OBJ1_B", "14"),
        ("OBJ1_C", "true"),
        ("OBJ1_D", "1, -2, 100, 3"),
        ("OBJ1_E", "12m"),
    ])
    .unwrap();
    assert_eq!(obj, expected_obj1());
}

#[test]
fn test_obj1_boundaries() {
    let max = u64::MAX.to_string();
    let obj: Obj1 = load(&[
        ("OBJ1_A", ""),
        ("OBJ1_B", max.as_str()),
        ("OBJ1_C", "false"),
        ("OBJ1_D", "1"),
        ("OBJ1_E", "1h12m"),
    ])
    .unwrap();
    assert_eq!(
        obj,
        Obj1 {
            a: String::new(),
            b: u64::MAX,
            c: false,
            d: vec![1],
            e: Duration::HOUR + Duration::MINUTE * 12,
        }
    );
}

#[test]
fn test_obj1_unicode_and_empty_sequence() {
    let obj: Obj1 = load(&[
        ("OBJ1_A", "亲蛙"),
        ("OBJ1_B", "0"),
        ("OBJ1_C", "TRUE"),
        ("OBJ1_D", ""),
        ("OBJ1_E", "0ns"),
    ])
    .unwrap();
    assert_eq!(obj.a, "亲蛙");
    assert!(obj.c);
    assert!(obj.d.is_empty());
    assert_eq!(obj.e, Duration::ZERO);
}

#[test]
fn test_obj1_negative_unsigned_fails() {
    let err = load::<Obj1>(&[
        ("OBJ1_A", "abc"),
        ("OBJ1_B", "-14"),
        ("OBJ1_C", "true"),
        ("OBJ1_D", "1, -2, 100, 3"),
        ("OBJ1_E", "12m"),
    ])
    .unwrap_err();
    assert_eq!(err.field_path(), "b");
    assert!(matches!(
        err.innermost(),
        Error::Parse { key, source: ParseError::InvalidFormat { .. } } if key == "OBJ1_B"
    ));
}

#[test]
fn test_obj1_missing_key_fails() {
    let err = load::<Obj1>(&[
        ("OBJ1_B", "14"),
        ("OBJ1_C", "true"),
        ("OBJ1_D", "1, -2, 100, 3"),
        ("OBJ1_E", "12m"),
    ])
    .unwrap_err();
    assert!(matches!(err.innermost(), Error::MissingKey { key } if key == "OBJ1_A"));
}

#[test]
fn test_obj1_invalid_duration_unit_fails() {
    let err = load::<Obj1>(&[
        ("OBJ1_A", "hello"),
        ("OBJ1_B", "14"),
        ("OBJ1_C", "true"),
        ("OBJ1_D", "1"),
        ("OBJ1_E", "30min"),
    ])
    .unwrap_err();
    assert!(matches!(
        err.innermost(),
        Error::Parse { key, source: ParseError::InvalidFormat { .. } } if key == "OBJ1_E"
    ));
}

#[test]
fn test_obj2_pointer_field() {
    let obj: Obj2 = load(&[("OBJ2_A", "hello")]).unwrap();
    assert_eq!(*obj.a, "hello");
    assert_eq!(obj.b, 0);
}

#[test]
fn test_nested_obj1_prefix_composition() {
    let mut vars = obj1_env("NESTED_");
    vars.push(("NESTED_OBJ1_F".to_string(), "65536".to_string()));
    let env: MapEnv = vars.into_iter().collect();

    let obj: NestedObj1 = EnvMarshaler::new(env).load().unwrap();
    assert_eq!(
        obj,
        NestedObj1 {
            a: expected_obj1(),
            f: 65536,
        }
    );
}

#[test]
fn test_nested_obj1_failures() {
    // nested field out of range
    let mut vars = obj1_env("NESTED_");
    vars.retain(|(key, _)| key != "NESTED_OBJ1_B");
    vars.push(("NESTED_OBJ1_B".to_string(), "-14".to_string()));
    vars.push(("NESTED_OBJ1_F".to_string(), "65536".to_string()));
    let err = EnvMarshaler::new(vars.into_iter().collect::<MapEnv>())
        .load::<NestedObj1>()
        .unwrap_err();
    assert_eq!(err.field_path(), "a.b");

    // keys without the prefix are not found
    let mut vars = obj1_env("");
    vars.push(("NESTED_OBJ1_F".to_string(), "65536".to_string()));
    let err = EnvMarshaler::new(vars.into_iter().collect::<MapEnv>())
        .load::<NestedObj1>()
        .unwrap_err();
    assert!(matches!(err.innermost(), Error::MissingKey { key } if key == "NESTED_OBJ1_A"));

    // missing top-level field after a complete nested struct
    let vars = obj1_env("NESTED_");
    let err = EnvMarshaler::new(vars.into_iter().collect::<MapEnv>())
        .load::<NestedObj1>()
        .unwrap_err();
    assert_eq!(err.field_path(), "f");
    assert!(matches!(err.innermost(), Error::MissingKey { key } if key == "NESTED_OBJ1_F"));
}

#[test]
fn test_nested_obj2_pointers_and_sequences() {
    let mut vars = obj1_env("NESTED_OBJ2_");
    vars.push(("NESTED_OBJ2_B".to_string(), "0, 1, 2, 4".to_string()));
    vars.push(("NESTED_OBJ2_C".to_string(), "0, 1, 2, 4".to_string()));
    let env: MapEnv = vars.into_iter().collect();

    let obj: NestedObj2 = EnvMarshaler::new(env).load().unwrap();
    assert_eq!(
        obj,
        NestedObj2 {
            a: Box::new(expected_obj1()),
            b: vec![0, 1, 2, 4],
            c: Box::new(vec![0, 1, 2, 4]),
        }
    );
}

#[test]
fn test_nested_obj2_failures() {
    let cases: &[(&str, Option<&str>, &str)] = &[
        // (key to override, value or None to remove, expected field path)
        ("NESTED_OBJ2_OBJ1_B", Some("-14"), "a.b"),
        ("NESTED_OBJ2_OBJ1_B", None, "a.b"),
        ("NESTED_OBJ2_B", Some("0,1,2,-4"), "b"),
        ("NESTED_OBJ2_C", Some("0,1,2,"), "c"),
        ("NESTED_OBJ2_B", None, "b"),
        ("NESTED_OBJ2_C", None, "c"),
    ];

    for (key, value, path) in cases {
        let mut env: MapEnv = obj1_env("NESTED_OBJ2_").into_iter().collect();
        env.insert("NESTED_OBJ2_B", "0,1,2,4");
        env.insert("NESTED_OBJ2_C", "0,1,2,4");
        match value {
            Some(value) => {
                env.insert(*key, *value);
            }
            None => {
                env.remove(key);
            }
        }

        let err = EnvMarshaler::new(env).load::<NestedObj2>().unwrap_err();
        assert_eq!(err.field_path(), *path, "overriding {key}");
    }
}

#[test]
fn test_sequence_element_error_reports_index() {
    let mut env: MapEnv = obj1_env("NESTED_OBJ2_").into_iter().collect();
    env.insert("NESTED_OBJ2_B", "0,1,x");
    env.insert("NESTED_OBJ2_C", "0");

    let err = EnvMarshaler::new(env).load::<NestedObj2>().unwrap_err();
    match err.innermost() {
        Error::Parse {
            source: ParseError::Element { index, .. },
            ..
        } => assert_eq!(*index, 2),
        other => panic!("expected element error, got {other:?}"),
    }
}

#[test]
fn test_failure_leaves_target_unchanged() {
    let marshaler = EnvMarshaler::new(MapEnv::from([("OBJ1_A", "new"), ("OBJ1_B", "1")]));
    let before = Obj1 {
        a: "old".to_string(),
        b: 99,
        c: true,
        d: vec![7],
        e: Duration::SECOND,
    };
    let mut obj = before.clone();

    let err = marshaler.unmarshal(&mut obj).unwrap_err();
    assert!(matches!(err.innermost(), Error::MissingKey { key } if key == "OBJ1_C"));
    assert_eq!(obj, before);
}

#[test]
fn test_missing_keys_in_traversal_order() {
    let marshaler = EnvMarshaler::new(MapEnv::from([
        ("NESTED_OBJ2_OBJ1_A", "hello"),
        ("NESTED_OBJ2_OBJ1_E", "1s"),
        ("NESTED_OBJ2_C", "1"),
    ]));

    assert_eq!(
        marshaler.missing_keys::<NestedObj2>(),
        [
            "NESTED_OBJ2_OBJ1_B",
            "NESTED_OBJ2_OBJ1_C",
            "NESTED_OBJ2_OBJ1_D",
            "NESTED_OBJ2_B",
        ]
    );
}

#[derive(Debug, Default, PartialEq, Unmarshal)]
#[env(custom)]
struct EnvMarshalerObj1 {
    #[env("ENV_MARSHALER_OBJ1_A")]
    a: u32,
    #[env("ENV_MARSHALER_OBJ1_B")]
    b: String,
}

impl EnvUnmarshaler for EnvMarshalerObj1 {
    fn unmarshal_env(&mut self, reader: &dyn EnvReader) -> anyhow::Result<()> {
        let b = reader
            .lookup_env("ENV_MARSHALER_OBJ1_B")
            .ok_or_else(|| anyhow::anyhow!("missing ENV_MARSHALER_OBJ1_B"))?;
        self.a = 3;
        self.b = b;
        Ok(())
    }
}

#[test]
fn test_custom_unmarshaler_replaces_field_walking() {
    for vars in [
        &[("ENV_MARSHALER_OBJ1_B", "a")][..],
        &[("ENV_MARSHALER_OBJ1_B", "")][..],
        &[("ENV_MARSHALER_OBJ1_A", "1"), ("ENV_MARSHALER_OBJ1_B", "")][..],
    ] {
        let obj: EnvMarshalerObj1 = load(vars).unwrap();
        assert_eq!(obj.a, 3);
        assert_eq!(obj.b, vars.last().map(|(_, v)| *v).unwrap_or_default());
    }
}

#[test]
fn test_custom_unmarshaler_failures() {
    for vars in [&[][..], &[("ENV_MARSHALER_OBJ1_A", "12")][..]] {
        let err = load::<EnvMarshalerObj1>(vars).unwrap_err();
        match err {
            Error::Custom { type_name, source } => {
                assert!(type_name.ends_with("EnvMarshalerObj1"));
                assert_eq!(source.to_string(), "missing ENV_MARSHALER_OBJ1_B");
            }
            other => panic!("expected custom error, got {other:?}"),
        }
    }
}

#[test]
fn test_custom_unmarshaler_has_no_known_keys() {
    let marshaler = EnvMarshaler::new(MapEnv::new());
    assert!(marshaler.missing_keys::<EnvMarshalerObj1>().is_empty());
}

#[derive(Debug, Default, PartialEq, Unmarshal)]
#[env(custom)]
struct EnvMarshalerObj2(u32);

impl EnvUnmarshaler for EnvMarshalerObj2 {
    fn unmarshal_env(&mut self, _reader: &dyn EnvReader) -> anyhow::Result<()> {
        self.0 = 1;
        Ok(())
    }
}

#[test]
fn test_custom_unmarshaler_on_tuple_struct() {
    let obj: EnvMarshalerObj2 = load(&[]).unwrap();
    assert_eq!(obj, EnvMarshalerObj2(1));
}

#[derive(Debug, Default, PartialEq, Unmarshal)]
struct WithCustomField {
    #[env("PRIMARY_")]
    primary: EnvMarshalerObj1,
    #[env("PORT")]
    port: u16,
}

#[test]
fn test_nested_custom_unmarshaler_sees_prefixed_keys() {
    let obj: WithCustomField = load(&[
        ("PRIMARY_ENV_MARSHALER_OBJ1_B", "scoped"),
        ("ENV_MARSHALER_OBJ1_B", "root"),
        ("PORT", "80"),
    ])
    .unwrap();
    assert_eq!(obj.primary.b, "scoped");
    assert_eq!(obj.port, 80);

    let err = load::<WithCustomField>(&[("ENV_MARSHALER_OBJ1_B", "root"), ("PORT", "80")])
        .unwrap_err();
    assert_eq!(err.field_path(), "primary");
    assert!(matches!(err.innermost(), Error::Custom { .. }));
}

#[test]
fn test_root_prefix_reaches_custom_unmarshaler() {
    let marshaler = EnvMarshaler::new(MapEnv::from([
        ("SVC_ENV_MARSHALER_OBJ1_B", "prefixed"),
        ("ENV_MARSHALER_OBJ1_B", "bare"),
    ]))
    .with_prefix("SVC_");

    let mut obj = EnvMarshalerObj1::default();
    marshaler.unmarshal(&mut obj).unwrap();
    assert_eq!(obj.b, "prefixed");
}

#[derive(Debug, Default, PartialEq)]
struct NonEnvMarshaler(u32);

impl FromEnvStr for NonEnvMarshaler {
    fn kind() -> Kind {
        Kind::U32
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        u32::from_value(value).map(NonEnvMarshaler)
    }
}

unmarshal_as_value!(NonEnvMarshaler);

#[derive(Debug, Default, PartialEq, Unmarshal)]
struct WithNewtype {
    #[env("COUNT")]
    count: NonEnvMarshaler,
}

#[test]
fn test_plain_value_target_is_rejected() {
    let marshaler = EnvMarshaler::new(MapEnv::from([("COUNT", "5")]));

    let mut value = NonEnvMarshaler(9);
    let err = marshaler.unmarshal(&mut value).unwrap_err();
    assert!(matches!(err, Error::NotStruct { type_name } if type_name.ends_with("NonEnvMarshaler")));
    assert_eq!(value, NonEnvMarshaler(9));

    let mut text = String::from("kept");
    assert!(matches!(
        marshaler.unmarshal(&mut text),
        Err(Error::NotStruct { .. })
    ));
    assert_eq!(text, "kept");
}

#[test]
fn test_newtype_field() {
    let obj: WithNewtype = load(&[("COUNT", "5")]).unwrap();
    assert_eq!(obj.count, NonEnvMarshaler(5));
}

#[derive(Debug, Default, Unmarshal)]
struct Timeouts {
    #[env("READ")]
    read: std::time::Duration,
    #[env("RATIO")]
    ratio: f32,
}

#[test]
fn test_std_duration_and_float_fields() {
    let obj: Timeouts = EnvMarshaler::new(MapEnv::from([
        ("TIMEOUT_READ", "1.5s"),
        ("TIMEOUT_RATIO", "0.25"),
    ]))
    .with_prefix("TIMEOUT_")
    .load()
    .unwrap();
    assert_eq!(obj.read, std::time::Duration::from_millis(1500));
    assert_eq!(obj.ratio, 0.25);

    let err = EnvMarshaler::new(MapEnv::from([("READ", "-1s"), ("RATIO", "1")]))
        .load::<Timeouts>()
        .unwrap_err();
    assert_eq!(err.field_path(), "read");
}

#[test]
fn test_file_fallback_reader() {
    let mut secret = NamedTempFile::new().unwrap();
    writeln!(secret, "from-file").unwrap();
    let path = secret.path().to_str().unwrap().to_string();

    let env = FileFallback::new(MapEnv::from([
        ("OBJ2_A_FILE", path.as_str()),
        ("OBJ1_A", "direct"),
    ]));
    let obj: Obj2 = EnvMarshaler::new(env).load().unwrap();
    assert_eq!(*obj.a, "from-file");
}

#[test]
fn test_file_fallback_reports_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-secret");
    let path = path.to_str().unwrap().to_string();

    let env = FileFallback::new(MapEnv::from([("OBJ2_A_FILE", path.as_str())]));
    let err = EnvMarshaler::new(env).load::<Obj2>().unwrap_err();

    assert_eq!(err.field_path(), "a");
    match err.innermost() {
        Error::FileRead { name, path: failed, .. } => {
            assert_eq!(name, "OBJ2_A_FILE");
            assert_eq!(*failed, path);
        }
        other => panic!("expected file read error, got {other:?}"),
    }
    assert!(err.to_string().contains("missing-secret"));
}

#[test]
fn test_dotenv_file_reader() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "OBJ1_A=hello").unwrap();
    writeln!(file, "OBJ1_B=14").unwrap();
    writeln!(file, "OBJ1_C=true").unwrap();
    writeln!(file, "OBJ1_D=\"1, -2, 100, 3\"").unwrap();
    writeln!(file, "OBJ1_E=12m").unwrap();

    let env = MapEnv::from_env_file(file.path()).unwrap();
    let obj: Obj1 = EnvMarshaler::new(env).load().unwrap();
    assert_eq!(obj, expected_obj1());
}

#[test]
#[serial]
fn test_from_env_process_environment() {
    for (key, value) in obj1_env("ENVTAG_IT_") {
        env::set_var(key, value);
    }
    env::set_var("ENVTAG_IT_NESTED_OBJ1_F", "7");

    #[derive(Debug, Default, Unmarshal)]
    struct Root {
        #[env("ENVTAG_IT_")]
        obj: Obj1,
        #[env("ENVTAG_IT_NESTED_OBJ1_F")]
        f: u8,
    }

    let root: Root = envtag::from_env().unwrap();
    assert_eq!(root.obj, expected_obj1());
    assert_eq!(root.f, 7);

    for (key, _) in obj1_env("ENVTAG_IT_") {
        env::remove_var(key);
    }
    env::remove_var("ENVTAG_IT_NESTED_OBJ1_F");
}

#[test]
#[serial]
fn test_from_env_missing_variable() {
    env::remove_var("ENVTAG_IT_OBJ2_A");

    #[derive(Debug, Default, Unmarshal)]
    struct Root {
        #[env("ENVTAG_IT_")]
        obj: Obj2,
    }

    let err = envtag::from_env::<Root>().unwrap_err();
    assert!(matches!(err.innermost(), Error::MissingKey { key } if key == "ENVTAG_IT_OBJ2_A"));
    assert!(err.to_string().contains("ENVTAG_IT_OBJ2_A"));
}
