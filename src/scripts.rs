//! Documentation about the various scripts contained herein
//!
//! - [check-container-running](#check-container-running)
//! - [check-container-services](#check-container-services)
//! - [check-container-logs](#check-container-logs)
//! - [metrics-container-stats](#metrics-container-stats)
//!
//! # check-container-running
//!
//! Needs access to the docker daemon's API.
//!
//! ```plain
//! $ check-container-running --help
//! Check that docker containers are running
//!
//! Either one container, given by id or name, or every running container whose name contains an expression. Any
//! container that is not running is CRITICAL, as is an explicit container docker doesn't know about.
//!
//! Usage: check-container-running [OPTIONS]
//!
//! Options:
//!   -H, --docker-host <DOCKER_HOST>
//!           Docker daemon to connect to. TCP: "host:port" or Unix: "/path/to/docker.sock"
//!
//!           [env: DOCKER_HOST=]
//!           [default: /var/run/docker.sock]
//!
//!   -p, --protocol <PROTOCOL>
//!           unix or http. Default: unix, unless the docker host starts with unix:// or tcp://
//!
//!       --timeout <SECONDS>
//!           Give up on a request to the daemon after this long
//!
//!           [default: 10]
//!
//!   -v, --verbose
//!           Log every request to stderr
//!
//!   -c, --container <CONTAINER>
//!           Id or name of the one container to check
//!
//!   -e, --expression <EXPRESSION>
//!           Check every container whose name contains this
//!
//!           [default: ]
//!
//!   -n, --names
//!           Refer to containers by name instead of id
//!
//!   -a, --all
//!           Also look at stopped containers when matching --expression
//!
//!       --missing <STATUS>
//!           Status to exit with when nothing matches --expression
//!
//!           [default: warning]
//!
//!   -h, --help
//!           Print help (see a summary with '-h')
//! ```
//!
//! # check-container-services
//!
//! Needs access to the API of a swarm manager.
//!
//! ```plain
//! $ check-container-services --help
//! Check that every swarm service has at least one running task
//!
//! A service with no running tasks is CRITICAL. Tasks that are down while others still run are listed, but the service
//! is still OK. Run this on a swarm manager, workers can't see the state of the swarm.
//!
//! Usage: check-container-services [OPTIONS]
//!
//! Options:
//!   -H, --docker-host <DOCKER_HOST>
//!           Docker daemon to connect to. TCP: "host:port" or Unix: "/path/to/docker.sock"
//!
//!           [env: DOCKER_HOST=]
//!           [default: /var/run/docker.sock]
//!
//!   -p, --protocol <PROTOCOL>
//!           unix or http. Default: unix, unless the docker host starts with unix:// or tcp://
//!
//!       --timeout <SECONDS>
//!           Give up on a request to the daemon after this long
//!
//!           [default: 10]
//!
//!   -v, --verbose
//!           Log every request to stderr
//!
//!   -e, --expression <EXPRESSION>
//!           Only check services whose name contains this
//!
//!           [default: ]
//!
//!   -f, --compose <COMPOSE_YAML_FILE>
//!           docker-compose file to read the desired number of replicas from
//!
//!       --missing <STATUS>
//!           Status to exit with when no service matches --expression
//!
//!           [default: ok]
//!
//!   -h, --help
//!           Print help (see a summary with '-h')
//! ```
//!
//! # check-container-logs
//!
//! Needs access to the docker daemon's API. `--hours-ago` and `--seconds-ago` need API version 1.19 or later.
//!
//! ```plain
//! $ check-container-logs --help
//! Check docker logs for lines that indicate a problem
//!
//! A line is a problem if it contains any of the red flags and none of the ignore patterns. Matching ignores case unless
//! `--case-sensitive` is given. The first problem in a container's logs makes the check CRITICAL.
//!
//! Usage: check-container-logs [OPTIONS]
//!
//! Options:
//!   -H, --docker-host <DOCKER_HOST>
//!           Docker daemon to connect to. TCP: "host:port" or Unix: "/path/to/docker.sock"
//!
//!           [env: DOCKER_HOST=]
//!           [default: /var/run/docker.sock]
//!
//!   -p, --protocol <PROTOCOL>
//!           unix or http. Default: unix, unless the docker host starts with unix:// or tcp://
//!
//!       --timeout <SECONDS>
//!           Give up on a request to the daemon after this long
//!
//!           [default: 10]
//!
//!   -v, --verbose
//!           Log every request to stderr
//!
//!   -n, --container-name <CONTAINER>
//!           Id or name of the one container to scan
//!
//!   -e, --expression <EXPRESSION>
//!           Scan every running container whose name contains this
//!
//!           [default: ]
//!
//!   -N, --names
//!           Refer to containers by name instead of id
//!
//!   -r, --red-flag <SUBSTRING>
//!           A log line containing this indicates an error; can be given multiple times
//!
//!   -i, --ignore-lines-with <SUBSTRING>
//!           A log line containing this is never an error; can be given multiple times
//!
//!   -c, --case-sensitive
//!           Match red flags and ignored lines case-sensitively
//!
//!   -t, --hours-ago <HOURS>
//!           Only read the logs of the last HOURS hours
//!
//!   -s, --seconds-ago <SECONDS>
//!           Only read the logs of the last SECONDS seconds, ignored with --hours-ago
//!
//!       --missing <STATUS>
//!           Status to exit with when nothing matches --expression
//!
//!           [default: warning]
//!
//!   -h, --help
//!           Print help (see a summary with '-h')
//! ```
//!
//! # metrics-container-stats
//!
//! Needs access to the API of a swarm manager. Prints Graphite plaintext.
//!
//! ```plain
//! $ metrics-container-stats --help
//! Print the resource usage of swarm service containers as Graphite metrics
//!
//! Every number in `docker stats` for each container whose name contains a service's name becomes one
//! `<scheme>.<container>.<path> <value> <time>` line. Exits WARNING if some containers' stats could not be read.
//!
//! Usage: metrics-container-stats [OPTIONS]
//!
//! Options:
//!   -H, --docker-host <DOCKER_HOST>
//!           Docker daemon to connect to. TCP: "host:port" or Unix: "/path/to/docker.sock"
//!
//!           [env: DOCKER_HOST=]
//!           [default: /var/run/docker.sock]
//!
//!   -p, --protocol <PROTOCOL>
//!           unix or http. Default: unix, unless the docker host starts with unix:// or tcp://
//!
//!       --timeout <SECONDS>
//!           Give up on a request to the daemon after this long
//!
//!           [default: 10]
//!
//!   -v, --verbose
//!           Log every request to stderr
//!
//!   -s, --scheme <SCHEME>
//!           Metric naming scheme, text to prepend to metric [default: <hostname>.docker]
//!
//!       --skip-key <KEY>
//!           Leave out this key and everything under it, wherever it appears; can be given multiple times.
//!           `read` is always left out
//!
//!   -h, --help
//!           Print help (see a summary with '-h')
//! ```
